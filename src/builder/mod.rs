//! Builder API for state machine construction.
//!
//! [`StateMachineBuilder`] collects a subsystem's states, asks each one for
//! its transitions and validates the resulting graph before handing back a
//! running [`StateMachine`](crate::machine::StateMachine). Validation reports
//! every problem in one [`BuildError::InvalidGraph`] instead of stopping at
//! the first.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::{BuildError, ConfigViolation};
pub use machine::StateMachineBuilder;
