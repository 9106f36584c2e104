//! One spin end-to-end: debit, provider call, settlement and bet clamping.
//!
//! The controller is the only writer of its [`GameSession`]. It is called through `&self` and can
//! be shared behind an `Arc`: the session sits in a mutex that is released before the provider is
//! awaited, so a second spin arriving mid-flight sees a non-idle session and is turned away
//! instead of queued.
//!
//! Cancellation never leaves the session stuck. Dropping a spin future after its bet was debited
//! runs the same recovery as a provider failure: back to idle, then refund or forfeit.
//!
//! Observers are notified while the session lock is held. A callback must not call back into
//! the controller, it would deadlock; it reads the session through the snapshot it receives.

use std::sync::Arc;

use log::{error, info, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    error::Result,
    machine::SpinOutcome,
    par_table::ParTable,
    provider::{LatencySpinProvider, SpinProvider},
    rng::{EntropyRandomSource, RandomSource, SeededRandomSource},
    session::{GameSession, GameStatus, SessionObserver, SessionSnapshot},
    settings::GameSettings,
    Credits,
};

/// Policies applied around each spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Granularity of a clamped bet.
    pub bet_step: Credits,
    /// Credit the bet back when the provider fails.
    pub refund_on_provider_failure: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bet_step: 10,
            refund_on_provider_failure: true,
        }
    }
}

impl From<&GameSettings> for ControllerConfig {
    fn from(settings: &GameSettings) -> Self {
        Self {
            bet_step: settings.bet_step,
            refund_on_provider_failure: settings.refund_on_provider_failure,
        }
    }
}

/// Why a spin produced no outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpinRejection {
    /// The session was not idle.
    #[error("Spin already in progress")]
    InProgress,
    /// The balance does not cover the bet.
    #[error("Insufficient balance for bet")]
    InsufficientBalance,
    /// The provider failed after the bet was debited.
    #[error("Spin failed: {0}")]
    ProviderFailure(String),
}

/// Drives a [`GameSession`] through spins served by a [`SpinProvider`].
pub struct GameController {
    session: Mutex<GameSession>,
    provider: Arc<dyn SpinProvider>,
    config: ControllerConfig,
}

impl GameController {
    /// Opens an idle session on `provider`.
    pub fn new(
        initial_balance: Credits,
        initial_bet: Credits,
        provider: Arc<dyn SpinProvider>,
        config: ControllerConfig,
    ) -> Result<Self> {
        Ok(Self {
            session: Mutex::new(GameSession::new(initial_balance, initial_bet)?),
            provider,
            config,
        })
    }

    /// Controller for a game definition: builds the machine and a [`LatencySpinProvider`].
    ///
    /// With a seed, the machine draws from it and the latency from the next seed, so a whole
    /// session replays identically. Without one both come from entropy.
    pub fn for_game(table: &ParTable, settings: &GameSettings) -> Result<Self> {
        let (machine_rng, latency_rng): (Box<dyn RandomSource>, Box<dyn RandomSource>) =
            match settings.seed {
                Some(seed) => (
                    Box::new(SeededRandomSource::new(seed)),
                    Box::new(SeededRandomSource::new(seed.wrapping_add(1))),
                ),
                None => (
                    Box::new(EntropyRandomSource::new()),
                    Box::new(EntropyRandomSource::new()),
                ),
            };

        let provider = LatencySpinProvider::new(
            table.build_machine(machine_rng)?,
            latency_rng,
            settings.latency.min,
            settings.latency.max,
        )?;

        info!(
            "New session: balance {}, bet {}",
            settings.initial_balance, settings.initial_bet
        );

        Self::new(
            settings.initial_balance,
            settings.initial_bet,
            Arc::new(provider),
            ControllerConfig::from(settings),
        )
    }

    /// Runs one spin. `None` when the spin was rejected or the provider failed.
    pub async fn spin(&self) -> Option<SpinOutcome> {
        self.try_spin().await.ok()
    }

    /// Same as [`GameController::spin`], with the reason of a missing outcome.
    pub async fn try_spin(&self) -> std::result::Result<SpinOutcome, SpinRejection> {
        let bet = self.place_bet()?;
        let pending = PendingSpin {
            controller: self,
            bet,
        };

        let result = self.provider.spin(bet).await;
        pending.disarm();

        match result {
            Ok(outcome) => {
                self.settle(&outcome);
                Ok(outcome)
            }
            Err(e) => {
                let reason = e.to_string();
                self.recover(bet, &reason);
                Err(SpinRejection::ProviderFailure(reason))
            }
        }
    }

    fn place_bet(&self) -> std::result::Result<Credits, SpinRejection> {
        let mut session = self.session.lock();

        if session.status() != GameStatus::Idle {
            warn!("{}", SpinRejection::InProgress);
            return Err(SpinRejection::InProgress);
        }
        if !session.can_place_bet() {
            warn!("{}", SpinRejection::InsufficientBalance);
            return Err(SpinRejection::InsufficientBalance);
        }

        let bet = session.bet();
        if let Err(e) = session.transition_to(GameStatus::Spinning) {
            error!("Cannot start spin: {}", e);
            return Err(SpinRejection::InProgress);
        }
        if let Err(e) = session.decrease_balance(bet) {
            error!("Cannot debit bet: {}", e);
            session.force_transition(GameStatus::Idle);
            return Err(SpinRejection::InsufficientBalance);
        }

        Ok(bet)
    }

    fn settle(&self, outcome: &SpinOutcome) {
        let mut session = self.session.lock();

        if let Err(e) = session.transition_to(GameStatus::Evaluating) {
            error!("Failed to transition to evaluating: {}", e);
        }

        if outcome.total_win > 0 {
            if let Err(e) = session.increase_balance(outcome.total_win) {
                error!("Cannot credit win of {}: {}", outcome.total_win, e);
            }
            if let Err(e) = session.transition_to(GameStatus::ShowingWin) {
                error!("Failed to transition to showingWin: {}", e);
            }
        } else if let Err(e) = session.transition_to(GameStatus::Idle) {
            error!("Failed to transition to idle: {}", e);
        }

        self.clamp_bet_to_balance(&mut session);
    }

    fn recover(&self, bet: Credits, reason: &str) {
        let mut session = self.session.lock();

        warn!("Spin error: {}", reason);
        session.force_transition(GameStatus::Idle);

        if self.config.refund_on_provider_failure {
            match session.increase_balance(bet) {
                Ok(()) => info!("Refunded bet of {}", bet),
                Err(e) => error!("Cannot refund bet of {}: {}", bet, e),
            }
        } else {
            warn!("Bet of {} forfeited", bet);
        }

        self.clamp_bet_to_balance(&mut session);
    }

    fn clamp_bet_to_balance(&self, session: &mut GameSession) {
        if let Some(bet) = clamped_bet(session.bet(), session.balance(), self.config.bet_step) {
            info!("Lowering bet from {} to {}", session.bet(), bet);
            if let Err(e) = session.set_bet(bet) {
                error!("Cannot clamp bet to {}: {}", bet, e);
            }
        }
    }

    /// Leaves [`GameStatus::ShowingWin`]. Returns `false` in any other state.
    pub fn finish_win_presentation(&self) -> bool {
        let mut session = self.session.lock();
        if session.status() != GameStatus::ShowingWin {
            return false;
        }
        session.transition_to(GameStatus::Idle).is_ok()
    }

    /// Changes the bet. Fails when it is not positive or exceeds the balance.
    pub fn set_bet(&self, bet: Credits) -> Result<()> {
        self.session.lock().set_bet(bet)
    }

    /// Current balance.
    pub fn balance(&self) -> Credits {
        self.session.lock().balance()
    }

    /// Current bet.
    pub fn bet(&self) -> Credits {
        self.session.lock().bet()
    }

    /// Current lifecycle state.
    pub fn status(&self) -> GameStatus {
        self.session.lock().status()
    }

    /// Balance, bet and status read under one lock.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// `true` when idle and the balance covers the bet.
    pub fn can_spin(&self) -> bool {
        let session = self.session.lock();
        session.status() == GameStatus::Idle && session.can_place_bet()
    }

    /// Registers `observer` for session changes. Returns `false` if it already was.
    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) -> bool {
        self.session.lock().subscribe(observer)
    }

    /// Removes `observer`. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, observer: &Arc<dyn SessionObserver>) -> bool {
        self.session.lock().unsubscribe(observer)
    }
}

/// A debited bet whose spin has not settled yet. Dropped armed, it recovers the session.
struct PendingSpin<'a> {
    controller: &'a GameController,
    bet: Credits,
}

impl PendingSpin<'_> {
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl Drop for PendingSpin<'_> {
    fn drop(&mut self) {
        self.controller.recover(self.bet, "spin cancelled");
    }
}

/// Bet to use when `bet` no longer fits `balance`, `None` when no change is needed or possible.
///
/// The bet is rounded down to a multiple of `step` (at least one step), or becomes the whole
/// balance when even one step is too much. A zero balance leaves the bet alone.
pub fn clamped_bet(bet: Credits, balance: Credits, step: Credits) -> Option<Credits> {
    if bet <= balance || balance <= 0 {
        return None;
    }

    let step = step.max(1);
    let rounded = step.max(balance / step * step);
    Some(if rounded <= balance { rounded } else { balance })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_rounds_down_to_step() {
        assert_eq!(clamped_bet(100, 95, 10), Some(90));
        assert_eq!(clamped_bet(100, 40, 10), Some(40));
        assert_eq!(clamped_bet(25, 12, 5), Some(10));
    }

    #[test]
    fn clamp_falls_back_to_balance_below_one_step() {
        assert_eq!(clamped_bet(10, 7, 10), Some(7));
        assert_eq!(clamped_bet(10, 1, 10), Some(1));
    }

    #[test]
    fn clamp_leaves_covered_or_unpayable_bets_alone() {
        assert_eq!(clamped_bet(10, 10, 10), None);
        assert_eq!(clamped_bet(10, 500, 10), None);
        assert_eq!(clamped_bet(10, 0, 10), None);
    }

    #[test]
    fn config_follows_settings() {
        let settings = GameSettings {
            bet_step: 25,
            refund_on_provider_failure: false,
            ..GameSettings::default()
        };
        assert_eq!(
            ControllerConfig::from(&settings),
            ControllerConfig {
                bet_step: 25,
                refund_on_provider_failure: false
            }
        );
    }
}
