//! Table-driven finite state machine.

use std::collections::{BTreeMap, BTreeSet};

/// A state change that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    /// State being left.
    pub from: S,
    /// State being entered.
    pub to: S,
}

/// Current state plus the set of permitted next states for each state.
#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    state: S,
    adjacency: BTreeMap<S, BTreeSet<S>>,
}

impl<S: Copy + Ord> StateMachine<S> {
    /// Builds a machine from `(state, allowed next states)` pairs.
    pub fn new<I, T>(initial: S, adjacency: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        T: IntoIterator<Item = S>,
    {
        Self {
            state: initial,
            adjacency: adjacency
                .into_iter()
                .map(|(from, to)| (from, to.into_iter().collect()))
                .collect(),
        }
    }

    /// Current state.
    pub fn state(&self) -> S {
        self.state
    }

    /// `true` when the table lists `target` as a successor of the current state.
    pub fn can_transition_to(&self, target: S) -> bool {
        self.adjacency
            .get(&self.state)
            .map(|next| next.contains(&target))
            .unwrap_or(false)
    }

    /// Moves to `target` if the table allows it, otherwise leaves the state untouched and
    /// returns the rejected transition.
    pub fn transition_to(&mut self, target: S) -> Result<Transition<S>, Transition<S>> {
        let transition = Transition {
            from: self.state,
            to: target,
        };
        if !self.can_transition_to(target) {
            return Err(transition);
        }
        self.state = target;
        Ok(transition)
    }

    /// Moves to `target` regardless of the table. Reserved for error recovery.
    pub fn force_transition(&mut self, target: S) -> Transition<S> {
        let transition = Transition {
            from: self.state,
            to: target,
        };
        self.state = target;
        transition
    }
}
