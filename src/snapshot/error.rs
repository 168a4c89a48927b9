//! Snapshot error types.

use thiserror::Error;

/// Why a machine snapshot could not be written or loaded.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot binary: {0}")]
    Binary(#[from] bincode::Error),

    /// Written by a build using another layout
    #[error("snapshot format v{found} cannot be read, this build reads v{expected}")]
    FormatVersion { found: u32, expected: u32 },

    /// Taken from a different subsystem than the caller asked for
    #[error("snapshot belongs to machine '{found}', expected '{expected}'")]
    WrongMachine { expected: String, found: String },

    /// The newest history entry does not end in the recorded state
    #[error("history ends in '{recorded}' but the snapshot's current state is '{current}'")]
    StateMismatch {
        recorded: &'static str,
        current: &'static str,
    },

    /// A transition is stamped later than the machine's tick count
    #[error("transition on tick {tick} but the machine only ran {ticks} ticks")]
    TickOutOfRange { tick: u64, ticks: u64 },
}
