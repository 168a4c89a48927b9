//! Read-only handles on a machine's current state.

use crate::core::StateKey;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cloneable, lock-free view of one machine's current state.
///
/// Sibling subsystems hold an observer instead of a reference to the
/// machine itself, e.g. the arm's scoring sequence polls the claw's
/// observer to decide when to advance. The machine publishes the new state
/// as soon as it becomes current, before `init()` of the entered state runs,
/// so the observer agrees with the machine even when a hook panics.
#[derive(Clone, Debug)]
pub struct StateObserver<K> {
    keys: Arc<[K]>,
    current: Arc<AtomicUsize>,
}

impl<K: StateKey> StateObserver<K> {
    pub(crate) fn new(keys: Arc<[K]>, initial: usize) -> Self {
        Self {
            keys,
            current: Arc::new(AtomicUsize::new(initial)),
        }
    }

    pub(crate) fn publish(&self, index: usize) {
        self.current.store(index, Ordering::Release);
    }

    /// The observed machine's current state.
    pub fn current_state(&self) -> K {
        self.keys[self.current.load(Ordering::Acquire)]
    }

    pub fn is_in(&self, key: K) -> bool {
        self.current_state() == key
    }

    /// True when the current state is any of `keys`.
    pub fn is_in_any(&self, keys: &[K]) -> bool {
        keys.contains(&self.current_state())
    }
}
