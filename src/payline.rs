//! Paylines: which cell of each reel forms a scoring line.

use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, Result},
    symbol::Symbol,
};

/// Visible window, column-major: `matrix[reel][row]`.
pub type Matrix = Vec<Vec<Symbol>>;

/// The ten lines of the default 5×4 game.
pub const PAYLINES_10: [[usize; 5]; 10] = [
    // Straights
    [0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1],
    [2, 2, 2, 2, 2],
    [3, 3, 3, 3, 3],
    // V shapes
    [0, 1, 2, 1, 0],
    [2, 1, 0, 1, 2],
    // Zig-zags
    [1, 2, 1, 2, 1],
    [2, 1, 2, 1, 2],
    [0, 1, 0, 1, 0],
    [3, 2, 3, 2, 3],
];

/// Row index to read on each reel, one entry per reel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payline {
    rows: Vec<usize>,
}

impl Payline {
    /// Wraps a row sequence.
    pub fn new(rows: Vec<usize>) -> Self {
        Self { rows }
    }

    /// Same row on every reel.
    pub fn straight(row: usize, reel_count: usize) -> Self {
        Self {
            rows: vec![row; reel_count],
        }
    }

    /// Row indices, one per reel.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Number of reels this line spans.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` for a line spanning no reel.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Checks the line against a grid of `reel_count` × `visible_rows`.
    pub fn validate(&self, reel_count: usize, visible_rows: usize) -> Result<()> {
        if self.rows.len() != reel_count {
            return Err(EngineError::DimensionMismatch(format!(
                "payline spans {} reels, machine has {}",
                self.rows.len(),
                reel_count
            )));
        }
        if let Some(row) = self.rows.iter().find(|row| **row >= visible_rows) {
            return Err(EngineError::DimensionMismatch(format!(
                "payline row {} outside {} visible rows",
                row, visible_rows
            )));
        }
        Ok(())
    }
}

impl From<[usize; 5]> for Payline {
    fn from(rows: [usize; 5]) -> Self {
        Self {
            rows: rows.to_vec(),
        }
    }
}

/// [`PAYLINES_10`] as owned paylines.
pub fn default_paylines() -> Vec<Payline> {
    PAYLINES_10.iter().copied().map(Payline::from).collect()
}

/// Reads the symbol under `payline` on every reel of `matrix`.
pub fn symbols_on_payline(matrix: &[Vec<Symbol>], payline: &Payline) -> Result<Vec<Symbol>> {
    if payline.len() != matrix.len() {
        return Err(EngineError::DimensionMismatch(
            "payline length must match matrix column count".to_string(),
        ));
    }

    matrix
        .iter()
        .zip(payline.rows())
        .enumerate()
        .map(|(reel, (column, row))| {
            column.get(*row).copied().ok_or_else(|| {
                EngineError::DimensionMismatch(format!("no symbol at [{}][{}]", reel, row))
            })
        })
        .collect()
}
