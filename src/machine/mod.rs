//! Running state machines.
//!
//! A [`StateMachine`] is ticked once per control cycle by its owner. Other
//! subsystems never call into it; they poll its state through a
//! [`StateObserver`].

mod error;
mod observer;
mod state_machine;

pub use error::MachineError;
pub use observer::StateObserver;
pub use state_machine::{StateMachine, TickOutcome};

pub(crate) use state_machine::Slot;
