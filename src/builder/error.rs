//! Build errors for state machine construction.

use thiserror::Error;

/// One problem found while validating a machine's transition graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("State '{state}' is registered more than once")]
    DuplicateState { state: String },

    #[error("Initial state '{state}' is not registered")]
    UnknownInitialState { state: String },

    #[error("Transition from '{from}' targets unregistered state '{to}'")]
    UnknownTarget { from: String, to: String },
}

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No states registered. Add at least one state with .state(key, state)")]
    NoStates,

    #[error("Machine '{machine}' failed validation with {} violation(s)", .violations.len())]
    InvalidGraph {
        machine: String,
        violations: Vec<ConfigViolation>,
    },
}
