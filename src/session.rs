//! Player session: balance, bet and lifecycle state, with change notifications.
//!
//! Balance and bet rules live next to the lifecycle state machine because they gate it: a bet
//! can only be placed from [`GameStatus::Idle`] and only when the balance covers it. Every
//! mutating call notifies its own observer category exactly once when it succeeds, and leaves
//! the session untouched when it fails.

use std::{fmt, sync::Arc};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, Result},
    fsm::{StateMachine, Transition},
    Credits,
};

/// Lifecycle of a spin as seen by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    /// Waiting for a bet. Initial state.
    Idle,
    /// Bet debited, outcome pending.
    Spinning,
    /// Outcome known, being settled.
    Evaluating,
    /// A win is on screen until the presentation is dismissed.
    ShowingWin,
}

impl GameStatus {
    /// Permitted successors of each state.
    pub fn adjacency() -> [(GameStatus, Vec<GameStatus>); 4] {
        use GameStatus::*;
        [
            (Idle, vec![Spinning]),
            (Spinning, vec![Evaluating]),
            (Evaluating, vec![ShowingWin, Idle]),
            (ShowingWin, vec![Idle]),
        ]
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameStatus::Idle => "idle",
            GameStatus::Spinning => "spinning",
            GameStatus::Evaluating => "evaluating",
            GameStatus::ShowingWin => "showingWin",
        };
        f.write_str(name)
    }
}

impl From<Transition<GameStatus>> for EngineError {
    fn from(rejected: Transition<GameStatus>) -> Self {
        EngineError::InvalidTransition {
            from: rejected.from,
            to: rejected.to,
        }
    }
}

/// Read-only copy of the session handed to observers and embedding code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Balance after the change.
    pub balance: Credits,
    /// Bet after the change.
    pub bet: Credits,
    /// Lifecycle state after the change.
    pub status: GameStatus,
}

/// Receives session changes. Every method defaults to doing nothing.
///
/// Callbacks run synchronously inside the mutating call. They may read the session through the
/// snapshot they receive but must not call back into a mutating operation.
pub trait SessionObserver: Send + Sync {
    /// Balance after an increase, decrease or reset.
    fn on_balance_change(&self, _balance: Credits, _session: &SessionSnapshot) {}
    /// Bet after a successful change.
    fn on_bet_change(&self, _bet: Credits, _session: &SessionSnapshot) {}
    /// Every transition, forced ones included.
    fn on_state_change(&self, _from: GameStatus, _to: GameStatus, _session: &SessionSnapshot) {}
}

/// Subscriber list with set semantics: an observer is identified by its allocation, so
/// subscribing the same `Arc` twice has no extra effect and unsubscribing is idempotent.
#[derive(Default, Clone)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl ObserverRegistry {
    /// Adds `observer` unless already present. Returns whether it was added.
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) -> bool {
        if self.position(&observer).is_some() {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Removes `observer`. Returns whether it was present.
    pub fn unsubscribe(&mut self, observer: &Arc<dyn SessionObserver>) -> bool {
        match self.position(observer) {
            Some(index) => {
                self.observers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// `true` when nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Observers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SessionObserver>> {
        self.observers.iter()
    }

    fn position(&self, observer: &Arc<dyn SessionObserver>) -> Option<usize> {
        // Compare data pointers only, vtable pointers are not unique per type.
        let target = Arc::as_ptr(observer) as *const ();
        self.observers
            .iter()
            .position(|o| Arc::as_ptr(o) as *const () == target)
    }
}

/// Balance, bet and lifecycle state of one player.
pub struct GameSession {
    balance: Credits,
    bet: Credits,
    fsm: StateMachine<GameStatus>,
    observers: ObserverRegistry,
}

impl GameSession {
    /// Opens an idle session. The bet must be positive and covered by the balance.
    pub fn new(initial_balance: Credits, initial_bet: Credits) -> Result<Self> {
        if initial_balance < 0 {
            return Err(EngineError::invalid("balance cannot be negative"));
        }
        if initial_bet <= 0 {
            return Err(EngineError::invalid("bet must be greater than zero"));
        }
        if initial_bet > initial_balance {
            return Err(EngineError::invalid("bet cannot exceed balance"));
        }

        Ok(Self {
            balance: initial_balance,
            bet: initial_bet,
            fsm: StateMachine::new(GameStatus::Idle, GameStatus::adjacency()),
            observers: ObserverRegistry::default(),
        })
    }

    /// Current lifecycle state.
    pub fn status(&self) -> GameStatus {
        self.fsm.state()
    }

    /// Current balance.
    pub fn balance(&self) -> Credits {
        self.balance
    }

    /// Current bet.
    pub fn bet(&self) -> Credits {
        self.bet
    }

    /// Current values as a plain copy.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            balance: self.balance,
            bet: self.bet,
            status: self.fsm.state(),
        }
    }

    /// `true` when `target` is a legal successor of the current state.
    pub fn can_transition_to(&self, target: GameStatus) -> bool {
        self.fsm.can_transition_to(target)
    }

    /// Applies a legal transition, fails with [`EngineError::InvalidTransition`] otherwise.
    pub fn transition_to(&mut self, target: GameStatus) -> Result<()> {
        let transition = self.fsm.transition_to(target)?;
        self.notify_state_change(transition);
        Ok(())
    }

    /// Moves to `target` whatever the current state. Only for error recovery.
    pub fn force_transition(&mut self, target: GameStatus) {
        let transition = self.fsm.force_transition(target);
        self.notify_state_change(transition);
    }

    /// Credits `amount`.
    pub fn increase_balance(&mut self, amount: Credits) -> Result<()> {
        if amount < 0 {
            return Err(EngineError::invalid("amount must be positive"));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| EngineError::invalid("balance overflow"))?;
        self.notify_balance_change();
        Ok(())
    }

    /// Debits `amount`, which must be covered by the balance.
    pub fn decrease_balance(&mut self, amount: Credits) -> Result<()> {
        if amount < 0 {
            return Err(EngineError::invalid("amount must be positive"));
        }
        if amount > self.balance {
            return Err(EngineError::InsufficientBalance {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        self.notify_balance_change();
        Ok(())
    }

    /// Overwrites the balance.
    pub fn set_balance(&mut self, balance: Credits) -> Result<()> {
        if balance < 0 {
            return Err(EngineError::invalid("balance cannot be negative"));
        }
        self.balance = balance;
        self.notify_balance_change();
        Ok(())
    }

    /// Changes the bet, which must be positive and covered by the balance.
    pub fn set_bet(&mut self, bet: Credits) -> Result<()> {
        if bet <= 0 {
            return Err(EngineError::invalid("bet must be greater than zero"));
        }
        if bet > self.balance {
            return Err(EngineError::invalid("bet cannot exceed balance"));
        }
        self.bet = bet;
        self.notify_bet_change();
        Ok(())
    }

    /// `true` only when idle and the balance covers the bet.
    pub fn can_place_bet(&self) -> bool {
        self.fsm.state() == GameStatus::Idle && self.balance >= self.bet
    }

    /// Debits the current bet if it can be placed.
    pub fn deduct_bet(&mut self) -> Result<()> {
        if !self.can_place_bet() {
            return Err(EngineError::invalid("cannot place bet in current state"));
        }
        self.decrease_balance(self.bet)
    }

    /// See [`ObserverRegistry::subscribe`].
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) -> bool {
        self.observers.subscribe(observer)
    }

    /// See [`ObserverRegistry::unsubscribe`].
    pub fn unsubscribe(&mut self, observer: &Arc<dyn SessionObserver>) -> bool {
        self.observers.unsubscribe(observer)
    }

    fn notify_balance_change(&self) {
        let snapshot = self.snapshot();
        for observer in self.observers.iter() {
            observer.on_balance_change(self.balance, &snapshot);
        }
    }

    fn notify_bet_change(&self) {
        let snapshot = self.snapshot();
        for observer in self.observers.iter() {
            observer.on_bet_change(self.bet, &snapshot);
        }
    }

    fn notify_state_change(&self, transition: Transition<GameStatus>) {
        debug!("Session: {} -> {}", transition.from, transition.to);
        let snapshot = self.snapshot();
        for observer in self.observers.iter() {
            observer.on_state_change(transition.from, transition.to, &snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SessionObserver for Recorder {
        fn on_balance_change(&self, balance: Credits, _: &SessionSnapshot) {
            self.events.lock().push(format!("balance:{}", balance));
        }
        fn on_bet_change(&self, bet: Credits, _: &SessionSnapshot) {
            self.events.lock().push(format!("bet:{}", bet));
        }
        fn on_state_change(&self, from: GameStatus, to: GameStatus, _: &SessionSnapshot) {
            self.events.lock().push(format!("{}->{}", from, to));
        }
    }

    fn session_with_recorder() -> (GameSession, Arc<Recorder>) {
        let mut session = GameSession::new(100, 10).unwrap();
        let recorder = Arc::new(Recorder::default());
        session.subscribe(recorder.clone());
        (session, recorder)
    }

    #[test]
    fn starts_idle() {
        let session = GameSession::new(100, 10).unwrap();
        assert_eq!(session.status(), GameStatus::Idle);
        assert!(session.can_place_bet());
    }

    #[test]
    fn constructor_validates_amounts() {
        assert!(GameSession::new(-1, 10).is_err());
        assert!(GameSession::new(100, 0).is_err());
        assert!(GameSession::new(5, 10).is_err());
    }

    #[test]
    fn full_lifecycle_is_allowed() {
        let (mut session, recorder) = session_with_recorder();
        session.transition_to(GameStatus::Spinning).unwrap();
        session.transition_to(GameStatus::Evaluating).unwrap();
        session.transition_to(GameStatus::ShowingWin).unwrap();
        session.transition_to(GameStatus::Idle).unwrap();

        assert_eq!(
            *recorder.events.lock(),
            vec![
                "idle->spinning",
                "spinning->evaluating",
                "evaluating->showingWin",
                "showingWin->idle"
            ]
        );
    }

    #[test]
    fn illegal_transition_fails_without_notification() {
        let (mut session, recorder) = session_with_recorder();
        let result = session.transition_to(GameStatus::ShowingWin);

        assert!(matches!(
            result,
            Err(EngineError::InvalidTransition {
                from: GameStatus::Idle,
                to: GameStatus::ShowingWin
            })
        ));
        assert_eq!(session.status(), GameStatus::Idle);
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn forced_transition_always_applies() {
        let (mut session, recorder) = session_with_recorder();
        session.transition_to(GameStatus::Spinning).unwrap();
        session.force_transition(GameStatus::Idle);

        assert_eq!(session.status(), GameStatus::Idle);
        assert_eq!(recorder.events.lock().last().unwrap(), "spinning->idle");
    }

    #[test]
    fn balance_rules() {
        let (mut session, recorder) = session_with_recorder();

        assert!(session.increase_balance(-5).is_err());
        assert!(session.decrease_balance(-5).is_err());
        assert!(matches!(
            session.decrease_balance(101),
            Err(EngineError::InsufficientBalance {
                balance: 100,
                requested: 101
            })
        ));
        assert!(session.set_balance(-1).is_err());
        assert_eq!(session.balance(), 100);
        assert!(recorder.events.lock().is_empty());

        session.increase_balance(50).unwrap();
        session.decrease_balance(30).unwrap();
        session.set_balance(70).unwrap();
        assert_eq!(
            *recorder.events.lock(),
            vec!["balance:150", "balance:120", "balance:70"]
        );
    }

    #[test]
    fn bet_rules() {
        let (mut session, recorder) = session_with_recorder();

        assert!(session.set_bet(0).is_err());
        assert!(session.set_bet(-10).is_err());
        assert!(session.set_bet(101).is_err());
        assert_eq!(session.bet(), 10);

        session.set_bet(100).unwrap();
        assert_eq!(session.bet(), 100);
        assert_eq!(*recorder.events.lock(), vec!["bet:100"]);
    }

    #[test]
    fn bet_placement_requires_idle_and_funds() {
        let mut session = GameSession::new(15, 10).unwrap();
        session.deduct_bet().unwrap();
        assert_eq!(session.balance(), 5);
        assert!(!session.can_place_bet());
        assert!(session.deduct_bet().is_err());

        session.set_balance(50).unwrap();
        session.transition_to(GameStatus::Spinning).unwrap();
        assert!(!session.can_place_bet());
    }

    #[test]
    fn registry_has_set_semantics() {
        let mut session = GameSession::new(100, 10).unwrap();
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn SessionObserver> = recorder.clone();

        assert!(session.subscribe(observer.clone()));
        assert!(!session.subscribe(observer.clone()));

        session.set_bet(20).unwrap();
        assert_eq!(recorder.events.lock().len(), 1);

        assert!(session.unsubscribe(&observer));
        assert!(!session.unsubscribe(&observer));
        session.set_bet(30).unwrap();
        assert_eq!(recorder.events.lock().len(), 1);
    }

    #[test]
    fn observers_see_updated_snapshot() {
        struct Check;
        impl SessionObserver for Check {
            fn on_state_change(&self, _: GameStatus, to: GameStatus, session: &SessionSnapshot) {
                assert_eq!(session.status, to);
            }
            fn on_balance_change(&self, balance: Credits, session: &SessionSnapshot) {
                assert_eq!(session.balance, balance);
            }
        }

        let mut session = GameSession::new(100, 10).unwrap();
        session.subscribe(Arc::new(Check));
        session.transition_to(GameStatus::Spinning).unwrap();
        session.decrease_balance(10).unwrap();
    }
}
