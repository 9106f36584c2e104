//! Payout multipliers per symbol and match count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, Result},
    symbol::Symbol,
};

/// Shortest run that can pay.
pub const MIN_MATCH: usize = 3;
/// Longest run that can pay.
pub const MAX_MATCH: usize = 5;

/// Multipliers of one symbol, keyed by match count (3, 4 or 5). Missing counts pay nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaytableEntry {
    pays: BTreeMap<usize, u64>,
}

impl PaytableEntry {
    /// Entry paying `three`, `four` and `five` for runs of 3, 4 and 5.
    pub fn new(three: u64, four: u64, five: u64) -> Self {
        Self {
            pays: BTreeMap::from([(3, three), (4, four), (5, five)]),
        }
    }

    /// Sets the multiplier for `count`, which must be within 3..=5.
    pub fn set(&mut self, count: usize, multiplier: u64) -> Result<()> {
        if !(MIN_MATCH..=MAX_MATCH).contains(&count) {
            return Err(EngineError::invalid(format!(
                "match count {} outside {}..={}",
                count, MIN_MATCH, MAX_MATCH
            )));
        }
        self.pays.insert(count, multiplier);
        Ok(())
    }

    /// Multiplier for `count`, zero when absent.
    pub fn get(&self, count: usize) -> u64 {
        self.pays.get(&count).copied().unwrap_or(0)
    }
}

/// Lookup from symbol and run length to payout multiplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paytable {
    entries: BTreeMap<Symbol, PaytableEntry>,
}

impl Paytable {
    /// Empty table: every lookup pays zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry of `symbol`.
    pub fn insert(&mut self, symbol: Symbol, entry: PaytableEntry) {
        self.entries.insert(symbol, entry);
    }

    /// Entry of `symbol`, if configured.
    pub fn entry(&self, symbol: Symbol) -> Option<&PaytableEntry> {
        self.entries.get(&symbol)
    }

    /// Entries in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &PaytableEntry)> {
        self.entries.iter()
    }

    /// Multiplier for a run of `count` symbols.
    ///
    /// Counts outside 3..=5 and unknown symbol/count pairs pay zero, they are not errors.
    pub fn payout_for(&self, symbol: Symbol, count: usize) -> u64 {
        if !(MIN_MATCH..=MAX_MATCH).contains(&count) {
            return 0;
        }
        self.entries
            .get(&symbol)
            .map(|entry| entry.get(count))
            .unwrap_or(0)
    }
}

impl FromIterator<(Symbol, PaytableEntry)> for Paytable {
    fn from_iter<I: IntoIterator<Item = (Symbol, PaytableEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Paytable of the default game.
pub fn default_paytable() -> Paytable {
    Paytable::from_iter([
        (Symbol::Orange, PaytableEntry::new(5, 20, 50)),
        (Symbol::Grape, PaytableEntry::new(10, 30, 75)),
        (Symbol::Bell, PaytableEntry::new(15, 40, 100)),
        (Symbol::Bar, PaytableEntry::new(20, 60, 150)),
        (Symbol::Seven, PaytableEntry::new(40, 120, 300)),
        (Symbol::Diamond, PaytableEntry::new(50, 150, 500)),
        (Symbol::Wild, PaytableEntry::new(100, 300, 1000)),
        (Symbol::Handcuffs, PaytableEntry::new(25, 80, 200)),
        (Symbol::Bank, PaytableEntry::new(30, 100, 250)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_symbol() {
        let table = default_paytable();
        for symbol in Symbol::ALL {
            let entry = table.entry(symbol).unwrap();
            assert!(entry.get(3) < entry.get(4));
            assert!(entry.get(4) < entry.get(5));
        }
        assert!(table.payout_for(Symbol::Wild, 5) > table.payout_for(Symbol::Seven, 5));
        assert!(table.payout_for(Symbol::Seven, 5) > table.payout_for(Symbol::Orange, 5));
    }

    #[test]
    fn valid_counts_return_configured_multiplier() {
        let table = default_paytable();
        assert_eq!(table.payout_for(Symbol::Seven, 5), 300);
        assert_eq!(table.payout_for(Symbol::Bell, 3), 15);
        assert_eq!(table.payout_for(Symbol::Bell, 4), 40);
        assert_eq!(table.payout_for(Symbol::Bell, 5), 100);
    }

    #[test]
    fn out_of_range_counts_pay_zero() {
        let table = default_paytable();
        for count in [0, 1, 2, 6, 10] {
            assert_eq!(table.payout_for(Symbol::Wild, count), 0);
        }
    }

    #[test]
    fn missing_entries_pay_zero() {
        let mut partial = PaytableEntry::default();
        partial.set(3, 10).unwrap();

        let mut table = Paytable::new();
        table.insert(Symbol::Orange, partial);

        assert_eq!(table.payout_for(Symbol::Orange, 3), 10);
        assert_eq!(table.payout_for(Symbol::Orange, 4), 0);
        assert_eq!(table.payout_for(Symbol::Grape, 3), 0);
    }

    #[test]
    fn entry_rejects_counts_outside_three_to_five() {
        let mut entry = PaytableEntry::default();
        assert!(entry.set(2, 1).is_err());
        assert!(entry.set(6, 1).is_err());
        assert!(entry.set(5, 1).is_ok());
    }
}
