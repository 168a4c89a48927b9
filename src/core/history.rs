//! State transition history tracking.
//!
//! Every machine keeps a bounded record of the transitions it performed so
//! a session can be inspected afterwards. Recording is O(1): once the
//! capacity is reached the oldest record is dropped.

use super::state::StateKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Number of transitions kept when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use tickwise::core::StateTransition;
/// use tickwise::state_enum;
/// use chrono::Utc;
///
/// state_enum! {
///     enum LedState {
///         Cone,
///         Cube,
///     }
/// }
///
/// let transition = StateTransition {
///     from: LedState::Cone,
///     to: LedState::Cube,
///     timestamp: Utc::now(),
///     tick: 42,
/// };
/// assert_eq!(transition.tick, 42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<K: StateKey> {
    /// The state being left
    pub from: K,
    /// The state being entered
    pub to: K,
    /// Wall-clock time of the transition
    pub timestamp: DateTime<Utc>,
    /// Machine tick on which the transition happened
    pub tick: u64,
}

/// Ordered, bounded history of state transitions.
///
/// # Example
///
/// ```rust
/// use tickwise::core::{StateHistory, StateTransition};
/// use tickwise::state_enum;
/// use chrono::Utc;
///
/// state_enum! {
///     enum Phase {
///         One,
///         Two,
///         Three,
///     }
/// }
///
/// let mut history = StateHistory::new();
/// history.record(StateTransition { from: Phase::One, to: Phase::Two, timestamp: Utc::now(), tick: 1 });
/// history.record(StateTransition { from: Phase::Two, to: Phase::Three, timestamp: Utc::now(), tick: 5 });
///
/// assert_eq!(history.get_path(), vec![&Phase::One, &Phase::Two, &Phase::Three]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "", from = "HistoryRecord<K>")]
pub struct StateHistory<K: StateKey> {
    transitions: VecDeque<StateTransition<K>>,
    capacity: usize,
}

/// Wire form of [`StateHistory`]; loaded data is re-bounded on conversion.
#[derive(Deserialize)]
#[serde(bound = "")]
struct HistoryRecord<K: StateKey> {
    transitions: VecDeque<StateTransition<K>>,
    capacity: usize,
}

impl<K: StateKey> From<HistoryRecord<K>> for StateHistory<K> {
    fn from(record: HistoryRecord<K>) -> Self {
        let capacity = record.capacity.max(1);
        let mut transitions = record.transitions;
        let excess = transitions.len().saturating_sub(capacity);
        transitions.drain(..excess);
        Self {
            transitions,
            capacity,
        }
    }
}

impl<K: StateKey> Default for StateHistory<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StateKey> StateHistory<K> {
    /// Create an empty history holding up to [`DEFAULT_HISTORY_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding up to `capacity` records (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            transitions: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Record a transition, evicting the oldest one when full.
    pub fn record(&mut self, transition: StateTransition<K>) {
        while self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// States traversed by the retained records: the `from` state of the
    /// oldest record, then the `to` state of each record.
    pub fn get_path(&self) -> Vec<&K> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Retained records, oldest first.
    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &StateTransition<K>> + '_ {
        self.transitions.iter()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&StateTransition<K>> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
