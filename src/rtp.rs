//! Return-to-player estimation by brute-force simulation.
//!
//! The simulator only drives [`SlotMachine::spin`]; with a seeded source the whole run, and
//! therefore every figure in the [`RtpReport`], is reproducible.

use std::collections::BTreeMap;

use log::info;

use crate::{
    error::{EngineError, Result},
    machine::SlotMachine,
    symbol::Symbol,
    Credits,
};

/// Aggregate figures of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RtpReport {
    /// `total_return / total_bet * 100`.
    pub rtp: f64,
    /// Sum of every wager, `spins * bet` saturated at [`Credits::MAX`].
    pub total_bet: Credits,
    /// Sum of every `total_win`, saturated at [`Credits::MAX`].
    pub total_return: Credits,
    /// Number of spins played.
    pub spins: u64,
    /// Spins that returned anything.
    pub wins: u64,
    /// `wins / spins * 100`.
    pub hit_rate: f64,
    /// How many line wins each (symbol, run length) produced.
    pub line_hits: BTreeMap<(Symbol, usize), u64>,
}

/// Spins `machine` exactly `spins` times at `bet`.
pub fn simulate(machine: &mut SlotMachine, spins: u64, bet: Credits) -> Result<RtpReport> {
    if spins == 0 {
        return Err(EngineError::invalid("spins must be greater than 0"));
    }
    if bet <= 0 {
        return Err(EngineError::invalid("bet must be greater than 0"));
    }

    let mut total_bet: Credits = 0;
    let mut total_return: Credits = 0;
    let mut wins = 0u64;
    let mut line_hits = BTreeMap::new();

    for _ in 0..spins {
        total_bet = total_bet.saturating_add(bet);

        let outcome = machine.spin(bet)?;
        total_return = total_return.saturating_add(outcome.total_win);

        if outcome.is_win() {
            wins += 1;
        }
        for win in &outcome.wins {
            *line_hits.entry((win.symbol, win.count)).or_insert(0) += 1;
        }
    }

    let rtp = total_return as f64 / total_bet as f64 * 100.0;
    let hit_rate = wins as f64 / spins as f64 * 100.0;

    info!(
        "Simulated {} spins at {}: RTP {:.2}%, hit rate {:.2}%",
        spins, bet, rtp, hit_rate
    );

    Ok(RtpReport {
        rtp,
        total_bet,
        total_return,
        spins,
        wins,
        hit_rate,
        line_hits,
    })
}

/// Mean RTP over `iterations` consecutive simulations of `spins_per_iteration` spins.
pub fn expected_rtp(
    machine: &mut SlotMachine,
    iterations: u64,
    spins_per_iteration: u64,
    bet: Credits,
) -> Result<f64> {
    if iterations == 0 {
        return Err(EngineError::invalid("iterations must be greater than 0"));
    }

    let mut total = 0.0;
    for _ in 0..iterations {
        total += simulate(machine, spins_per_iteration, bet)?.rtp;
    }

    Ok(total / iterations as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        machine::SlotMachineConfig, par_table::create_deterministic_slot_machine,
        payline::default_paylines, paytable::default_paytable, reel_strip::ReelStrip,
        rng::SeededRandomSource,
    };

    #[test]
    fn totals_add_up() {
        let mut machine = create_deterministic_slot_machine(12345).unwrap();
        let report = simulate(&mut machine, 500, 10).unwrap();

        assert_eq!(report.spins, 500);
        assert_eq!(report.total_bet, 5000);
        assert!(report.wins <= report.spins);
        assert!((0.0..=100.0).contains(&report.hit_rate));
        assert!(report.rtp >= 0.0);
        assert!(report.line_hits.values().sum::<u64>() >= report.wins);
    }

    #[test]
    fn seeded_runs_are_identical() {
        let mut a = create_deterministic_slot_machine(42).unwrap();
        let mut b = create_deterministic_slot_machine(42).unwrap();

        let first = simulate(&mut a, 1_000, 5).unwrap();
        let second = simulate(&mut b, 1_000, 5).unwrap();

        assert_eq!(first.total_return, second.total_return);
        assert_eq!(first.rtp.to_bits(), second.rtp.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn huge_bets_saturate_the_totals() {
        let strip = ReelStrip::from(vec![Symbol::Wild; 4]);
        let mut machine = SlotMachine::new(
            SlotMachineConfig {
                reels: vec![strip; 5],
                paylines: default_paylines(),
                paytable: default_paytable(),
                visible_rows: 4,
            },
            Box::new(SeededRandomSource::new(3)),
        )
        .unwrap();

        let report = simulate(&mut machine, 3, Credits::MAX / 2).unwrap();

        assert_eq!(report.total_bet, Credits::MAX);
        assert_eq!(report.total_return, Credits::MAX);
        assert_eq!(report.wins, 3);
    }

    #[test]
    fn rejects_empty_runs() {
        let mut machine = create_deterministic_slot_machine(1).unwrap();
        assert!(simulate(&mut machine, 0, 10).is_err());
        assert!(simulate(&mut machine, 10, 0).is_err());
        assert!(expected_rtp(&mut machine, 0, 10, 10).is_err());
    }

    #[test]
    fn expected_rtp_averages_runs() {
        let mut machine = create_deterministic_slot_machine(7).unwrap();
        let mut replay = create_deterministic_slot_machine(7).unwrap();

        let average = expected_rtp(&mut machine, 3, 200, 1).unwrap();
        let manual = (0..3)
            .map(|_| simulate(&mut replay, 200, 1).unwrap().rtp)
            .sum::<f64>()
            / 3.0;

        assert!((average - manual).abs() < 1e-9);
    }
}
