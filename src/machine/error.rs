//! Runtime errors reported by a built state machine.

use thiserror::Error;

/// Errors from administrative operations on a running machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("State '{state}' is not registered in machine '{machine}'")]
    UnknownState { machine: String, state: String },
}
