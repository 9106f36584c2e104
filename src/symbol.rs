//! Closed set of reel symbols.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A reel symbol, compared by identity only.
///
/// The declaration order is the order used whenever symbols are iterated from a map (strip
/// construction, paytable listing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Symbol {
    /// Orange fruit.
    Orange,
    /// Grape bunch.
    Grape,
    /// Bell.
    Bell,
    /// Bar.
    Bar,
    /// Lucky seven.
    Seven,
    /// Diamond.
    Diamond,
    /// Plain symbol for now: no substitution is evaluated.
    Wild,
    /// Handcuffs.
    Handcuffs,
    /// Bank vault.
    Bank,
}

impl Symbol {
    /// Every symbol, in declaration order.
    pub const ALL: [Symbol; 9] = [
        Symbol::Orange,
        Symbol::Grape,
        Symbol::Bell,
        Symbol::Bar,
        Symbol::Seven,
        Symbol::Diamond,
        Symbol::Wild,
        Symbol::Handcuffs,
        Symbol::Bank,
    ];

    /// Upper-case identifier used in game files and on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::Orange => "ORANGE",
            Symbol::Grape => "GRAPE",
            Symbol::Bell => "BELL",
            Symbol::Bar => "BAR",
            Symbol::Seven => "SEVEN",
            Symbol::Diamond => "DIAMOND",
            Symbol::Wild => "WILD",
            Symbol::Handcuffs => "HANDCUFFS",
            Symbol::Bank => "BANK",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` keeps width/alignment flags working in the par table listing
        f.pad(self.name())
    }
}

impl FromStr for Symbol {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Symbol::ALL
            .iter()
            .find(|symbol| symbol.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| EngineError::Config(format!("Unknown symbol \"{}\"", s)))
    }
}
