//! Core state machine types.
//!
//! This module contains the building blocks every subsystem uses:
//! - State identities (`StateKey`) and behaviour (`State`)
//! - Guard predicates and ordered transition tables
//! - Bounded transition history
//!
//! Guards and transition selection are pure; all side effects live in the
//! state lifecycle hooks.

mod guard;
mod history;
mod state;
mod transition;

pub use guard::Guard;
pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use state::{Activation, State, StateKey};
pub use transition::{Transition, Transitions};
