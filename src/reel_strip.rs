//! Reel strips built from symbol weights.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, Result},
    rng::{self, RandomSource},
    symbol::Symbol,
};

/// Number of copies of each symbol on a strip. Non-positive weights are ignored.
pub type SymbolWeights = BTreeMap<Symbol, i64>;

/// Ordered sequence of symbols a reel scrolls through. Reads wrap around modulo its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReelStrip {
    symbols: Vec<Symbol>,
}

impl ReelStrip {
    /// Appends each symbol `weight` times, in symbol order.
    pub fn build(weights: &SymbolWeights) -> Result<Self> {
        let symbols: Vec<Symbol> = weights
            .iter()
            .filter(|(_, weight)| **weight > 0)
            .flat_map(|(symbol, weight)| std::iter::repeat(*symbol).take(*weight as usize))
            .collect();

        if symbols.is_empty() {
            return Err(EngineError::EmptyStrip);
        }

        Ok(Self { symbols })
    }

    /// Returns a shuffled permutation of this strip, leaving `self` untouched.
    pub fn shuffled<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Self> {
        Ok(Self {
            symbols: rng::shuffle(&self.symbols, rng)?,
        })
    }

    /// Returns `visible_rows` symbols starting at `start_index`, wrapping past the end.
    pub fn extract_visible(&self, start_index: usize, visible_rows: usize) -> Result<Vec<Symbol>> {
        if self.symbols.is_empty() {
            return Err(EngineError::EmptyStrip);
        }
        if visible_rows == 0 {
            return Err(EngineError::invalid("visible rows must be greater than 0"));
        }

        let len = self.symbols.len();
        let start = start_index % len;
        Ok((0..visible_rows)
            .map(|i| self.symbols[(start + i) % len])
            .collect())
    }

    /// Strip length.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// `true` when the strip holds no symbol.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Occurrences of `symbol` on the strip.
    pub fn count(&self, symbol: Symbol) -> usize {
        self.symbols.iter().filter(|s| **s == symbol).count()
    }

    /// The symbols in strip order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

impl From<Vec<Symbol>> for ReelStrip {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandomSource;
    use crate::symbol::Symbol::*;

    fn weights(entries: &[(Symbol, i64)]) -> SymbolWeights {
        entries.iter().copied().collect()
    }

    #[test]
    fn build_repeats_symbols_by_weight() {
        let strip = ReelStrip::build(&weights(&[(Orange, 5), (Grape, 3), (Bell, 2), (Bar, 0)]))
            .unwrap();

        assert_eq!(strip.len(), 10);
        assert_eq!(strip.count(Orange), 5);
        assert_eq!(strip.count(Grape), 3);
        assert_eq!(strip.count(Bell), 2);
        assert_eq!(strip.count(Bar), 0);
        assert_eq!(&strip.symbols()[..6], &[Orange, Orange, Orange, Orange, Orange, Grape]);
    }

    #[test]
    fn build_skips_negative_weights() {
        let strip = ReelStrip::build(&weights(&[(Orange, 5), (Grape, -3)])).unwrap();
        assert_eq!(strip.len(), 5);
        assert!(strip.symbols().iter().all(|s| *s == Orange));
    }

    #[test]
    fn build_rejects_all_non_positive() {
        let result = ReelStrip::build(&weights(&[(Orange, 0), (Grape, -1)]));
        assert!(matches!(result, Err(EngineError::EmptyStrip)));
        assert!(matches!(
            ReelStrip::build(&SymbolWeights::new()),
            Err(EngineError::EmptyStrip)
        ));
    }

    #[test]
    fn shuffle_is_deterministic_and_non_destructive() {
        let strip = ReelStrip::from(vec![Orange, Grape, Bell, Bar, Seven]);
        let a = strip.shuffled(&mut SeededRandomSource::new(42)).unwrap();
        let b = strip.shuffled(&mut SeededRandomSource::new(42)).unwrap();

        assert_eq!(a, b);
        assert_eq!(strip.symbols(), &[Orange, Grape, Bell, Bar, Seven]);
        for symbol in [Orange, Grape, Bell, Bar, Seven] {
            assert_eq!(a.count(symbol), 1);
        }
    }

    #[test]
    fn extract_visible_wraps() {
        let strip = ReelStrip::from(vec![Orange, Grape, Bell, Bar, Seven]);
        assert_eq!(strip.extract_visible(0, 3).unwrap(), vec![Orange, Grape, Bell]);
        assert_eq!(
            strip.extract_visible(3, 4).unwrap(),
            vec![Bar, Seven, Orange, Grape]
        );
        assert_eq!(strip.extract_visible(4, 2).unwrap(), vec![Seven, Orange]);
    }

    #[test]
    fn extract_visible_rejects_bad_input() {
        let empty = ReelStrip::from(vec![]);
        assert!(matches!(
            empty.extract_visible(0, 3),
            Err(EngineError::EmptyStrip)
        ));

        let strip = ReelStrip::from(vec![Orange, Grape, Bell]);
        assert!(matches!(
            strip.extract_visible(0, 0),
            Err(EngineError::InvalidArgument(_))
        ));
    }
}
