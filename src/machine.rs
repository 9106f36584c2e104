//! Spin evaluation: reel stops, visible matrix and line wins.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, Result},
    payline::{symbols_on_payline, Matrix, Payline},
    paytable::{Paytable, MIN_MATCH},
    reel_strip::ReelStrip,
    rng::RandomSource,
    symbol::Symbol,
    Credits,
};

/// A paying run on one payline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWin {
    /// Position of the payline in the machine's table.
    pub payline_index: usize,
    /// Symbol of the leading run.
    pub symbol: Symbol,
    /// Length of the leading run (3 to 5).
    pub count: usize,
    /// Multiplier times bet.
    pub payout: Credits,
}

/// Where a reel stopped. Only the renderer cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelStop {
    /// Reel this stop belongs to, left to right.
    pub reel_index: usize,
    /// Strip offset of the top visible symbol.
    pub start_index: usize,
}

/// Immutable result of one spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Visible window, `matrix[reel][row]`.
    pub matrix: Matrix,
    /// Line wins in payline order.
    pub wins: Vec<LineWin>,
    /// Sum of every line win payout.
    pub total_win: Credits,
    /// Per-reel stop offsets.
    pub reels: Vec<ReelStop>,
}

impl SpinOutcome {
    /// Builds an outcome, deriving `total_win` from `wins`. The total saturates at
    /// [`Credits::MAX`] like each line payout does.
    pub fn new(matrix: Matrix, wins: Vec<LineWin>, reels: Vec<ReelStop>) -> Self {
        let total_win = wins
            .iter()
            .fold(0, |total: Credits, win| total.saturating_add(win.payout));
        Self {
            matrix,
            wins,
            total_win,
            reels,
        }
    }

    /// `true` when at least one line paid.
    pub fn is_win(&self) -> bool {
        self.total_win > 0
    }
}

/// Everything a [`SlotMachine`] is made of, apart from its random source.
#[derive(Debug, Clone)]
pub struct SlotMachineConfig {
    /// One strip per reel, left to right.
    pub reels: Vec<ReelStrip>,
    /// Lines evaluated on every spin, in order.
    pub paylines: Vec<Payline>,
    /// Multipliers per symbol and run length.
    pub paytable: Paytable,
    /// Height of the visible window.
    pub visible_rows: usize,
}

/// Produces spin outcomes from reel strips, paylines and a paytable.
pub struct SlotMachine {
    reels: Vec<ReelStrip>,
    paylines: Vec<Payline>,
    paytable: Paytable,
    visible_rows: usize,
    rng: Box<dyn RandomSource>,
}

impl SlotMachine {
    /// Validates the configuration up front so that `spin` can only fail on its own argument.
    pub fn new(config: SlotMachineConfig, rng: Box<dyn RandomSource>) -> Result<Self> {
        let SlotMachineConfig {
            reels,
            paylines,
            paytable,
            visible_rows,
        } = config;

        if reels.is_empty() {
            return Err(EngineError::invalid("at least one reel is required"));
        }
        if paylines.is_empty() {
            return Err(EngineError::invalid("at least one payline is required"));
        }
        if visible_rows == 0 {
            return Err(EngineError::invalid("visible rows must be greater than 0"));
        }
        for (index, strip) in reels.iter().enumerate() {
            if strip.is_empty() {
                return Err(EngineError::EmptyStrip);
            }
            if strip.len() < visible_rows {
                return Err(EngineError::DimensionMismatch(format!(
                    "reel {} has {} symbols, fewer than {} visible rows",
                    index,
                    strip.len(),
                    visible_rows
                )));
            }
        }
        for payline in &paylines {
            payline.validate(reels.len(), visible_rows)?;
        }

        Ok(Self {
            reels,
            paylines,
            paytable,
            visible_rows,
            rng,
        })
    }

    /// Draws one stop per reel, in reel order, and evaluates every payline for `bet`.
    pub fn spin(&mut self, bet: Credits) -> Result<SpinOutcome> {
        if bet <= 0 {
            return Err(EngineError::invalid("bet must be greater than 0"));
        }

        let (matrix, reels) = self.generate_matrix()?;
        let wins = evaluate_matrix(&matrix, &self.paylines, &self.paytable, bet)?;
        let outcome = SpinOutcome::new(matrix, wins, reels);

        debug!(
            "Spin: [{}] win: {}",
            outcome
                .matrix
                .iter()
                .map(|column| column.iter().join(" "))
                .join(" | "),
            outcome.total_win
        );

        Ok(outcome)
    }

    // Exactly one draw per reel, left to right: seeded replays depend on this order.
    fn generate_matrix(&mut self) -> Result<(Matrix, Vec<ReelStop>)> {
        let mut matrix = Vec::with_capacity(self.reels.len());
        let mut stops = Vec::with_capacity(self.reels.len());

        for (reel_index, strip) in self.reels.iter().enumerate() {
            let start_index = self.rng.next_int(strip.len())?;
            matrix.push(strip.extract_visible(start_index, self.visible_rows)?);
            stops.push(ReelStop {
                reel_index,
                start_index,
            });
        }

        Ok((matrix, stops))
    }

    /// Number of reels.
    pub fn reel_count(&self) -> usize {
        self.reels.len()
    }

    /// Height of the visible window.
    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Number of paylines.
    pub fn payline_count(&self) -> usize {
        self.paylines.len()
    }

    /// Strips in reel order.
    pub fn reels(&self) -> &[ReelStrip] {
        &self.reels
    }

    /// Paylines in evaluation order.
    pub fn paylines(&self) -> &[Payline] {
        &self.paylines
    }

    /// Paytable used to score line wins.
    pub fn paytable(&self) -> &Paytable {
        &self.paytable
    }
}

/// Evaluates every payline of `matrix` in table order.
pub fn evaluate_matrix(
    matrix: &[Vec<Symbol>],
    paylines: &[Payline],
    paytable: &Paytable,
    bet: Credits,
) -> Result<Vec<LineWin>> {
    let mut wins = Vec::new();
    for (payline_index, payline) in paylines.iter().enumerate() {
        let symbols = symbols_on_payline(matrix, payline)?;
        if let Some(win) = evaluate_line(&symbols, payline_index, paytable, bet) {
            wins.push(win);
        }
    }
    Ok(wins)
}

/// Scores the leading run of `symbols`. A later run after a mismatch never counts.
pub fn evaluate_line(
    symbols: &[Symbol],
    payline_index: usize,
    paytable: &Paytable,
    bet: Credits,
) -> Option<LineWin> {
    let first = *symbols.first()?;
    let count = symbols.iter().take_while(|s| **s == first).count();

    if count < MIN_MATCH {
        return None;
    }

    let multiplier = paytable.payout_for(first, count);
    if multiplier == 0 {
        return None;
    }

    Some(LineWin {
        payline_index,
        symbol: first,
        count,
        payout: (multiplier as Credits).saturating_mul(bet),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        payline::default_paylines,
        paytable::{default_paytable, PaytableEntry},
        rng::SeededRandomSource,
        symbol::Symbol::*,
    };

    fn uniform_reel(symbol: Symbol) -> ReelStrip {
        ReelStrip::from(vec![symbol; 4])
    }

    fn config(reels: Vec<ReelStrip>) -> SlotMachineConfig {
        SlotMachineConfig {
            reels,
            paylines: vec![Payline::straight(0, 5)],
            paytable: default_paytable(),
            visible_rows: 4,
        }
    }

    fn machine(reels: Vec<ReelStrip>) -> SlotMachine {
        SlotMachine::new(config(reels), Box::new(SeededRandomSource::new(1))).unwrap()
    }

    #[test]
    fn five_sevens_pay_the_five_of_a_kind() {
        let mut machine = machine(vec![uniform_reel(Seven); 5]);
        let outcome = machine.spin(10).unwrap();

        assert_eq!(outcome.wins.len(), 1);
        assert_eq!(outcome.wins[0].symbol, Seven);
        assert_eq!(outcome.wins[0].count, 5);
        assert_eq!(outcome.wins[0].payout, 300 * 10);
        assert_eq!(outcome.total_win, 3000);
        assert_eq!(outcome.matrix.len(), 5);
        assert!(outcome.matrix.iter().all(|column| column.len() == 4));
    }

    #[test]
    fn only_the_leading_run_counts() {
        let reels = vec![
            uniform_reel(Bell),
            uniform_reel(Bell),
            uniform_reel(Bell),
            uniform_reel(Grape),
            uniform_reel(Bell),
        ];
        let outcome = machine(reels).spin(1).unwrap();

        assert_eq!(outcome.wins.len(), 1);
        assert_eq!(outcome.wins[0].symbol, Bell);
        assert_eq!(outcome.wins[0].count, 3);
        assert_eq!(outcome.total_win, 15);
    }

    #[test]
    fn trailing_run_after_a_break_pays_nothing() {
        let symbols = [Grape, Bell, Bell, Bell, Bell];
        assert_eq!(evaluate_line(&symbols, 0, &default_paytable(), 1), None);
    }

    #[test]
    fn zero_multiplier_records_no_win() {
        let mut paytable = Paytable::new();
        let mut entry = PaytableEntry::default();
        entry.set(5, 0).unwrap();
        paytable.insert(Seven, entry);

        let symbols = [Seven; 5];
        assert_eq!(evaluate_line(&symbols, 0, &paytable, 10), None);
    }

    #[test]
    fn total_is_sum_of_line_wins() {
        let matrix: Matrix = vec![vec![Orange; 4]; 5];
        let wins = evaluate_matrix(&matrix, &default_paylines(), &default_paytable(), 2).unwrap();
        let outcome = SpinOutcome::new(matrix, wins, vec![]);

        assert_eq!(outcome.wins.len(), 10);
        assert_eq!(outcome.total_win, 10 * 50 * 2);
        assert_eq!(
            outcome.total_win,
            outcome.wins.iter().map(|w| w.payout).sum::<Credits>()
        );
    }

    #[test]
    fn huge_bet_saturates_instead_of_overflowing() {
        let mut machine = SlotMachine::new(
            SlotMachineConfig {
                paylines: default_paylines(),
                ..config(vec![uniform_reel(Wild); 5])
            },
            Box::new(SeededRandomSource::new(1)),
        )
        .unwrap();

        let outcome = machine.spin(Credits::MAX / 100).unwrap();

        assert_eq!(outcome.wins.len(), 10);
        assert!(outcome.wins.iter().all(|w| w.payout == Credits::MAX));
        assert_eq!(outcome.total_win, Credits::MAX);
    }

    #[test]
    fn spin_rejects_non_positive_bet() {
        let mut machine = machine(vec![uniform_reel(Seven); 5]);
        assert!(matches!(machine.spin(0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(machine.spin(-5), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn construction_fails_fast() {
        let rng = || Box::new(SeededRandomSource::new(1)) as Box<dyn RandomSource>;

        assert!(SlotMachine::new(config(vec![]), rng()).is_err());

        let mut no_lines = config(vec![uniform_reel(Seven); 5]);
        no_lines.paylines.clear();
        assert!(SlotMachine::new(no_lines, rng()).is_err());

        let mut no_rows = config(vec![uniform_reel(Seven); 5]);
        no_rows.visible_rows = 0;
        assert!(SlotMachine::new(no_rows, rng()).is_err());

        let mut short = vec![uniform_reel(Seven); 5];
        short[2] = ReelStrip::from(vec![Seven, Bell]);
        assert!(matches!(
            SlotMachine::new(config(short), rng()),
            Err(EngineError::DimensionMismatch(_))
        ));

        let mut wide = config(vec![uniform_reel(Seven); 5]);
        wide.paylines = vec![Payline::straight(0, 3)];
        assert!(matches!(
            SlotMachine::new(wide, rng()),
            Err(EngineError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn one_draw_per_reel_in_order() {
        let strip = ReelStrip::from(vec![Orange, Grape, Bell, Bar, Seven, Diamond]);
        let mut machine = SlotMachine::new(
            config(vec![strip.clone(); 5]),
            Box::new(SeededRandomSource::new(7)),
        )
        .unwrap();
        let outcome = machine.spin(1).unwrap();

        let mut replay = SeededRandomSource::new(7);
        for stop in &outcome.reels {
            assert_eq!(stop.start_index, replay.next_int(strip.len()).unwrap());
            assert_eq!(
                outcome.matrix[stop.reel_index],
                strip.extract_visible(stop.start_index, 4).unwrap()
            );
        }
        assert_eq!(outcome.reels.len(), 5);
    }
}
