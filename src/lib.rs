//! Tickwise: tick-driven state machines and trajectory tracking
//!
//! A robot controller is a fixed-rate loop. Every cycle, each subsystem
//! (arm, claw, drivetrain, lights) advances its own finite state machine by
//! one tick, and a drivetrain following a path computes a fresh command
//! from the planned trajectory and the measured pose.
//!
//! # Core Concepts
//!
//! - **State**: a mode of one subsystem with `build`/`init`/`execute`/`exit` hooks
//! - **Guards**: pure predicates over a read-only input snapshot
//! - **StateMachine**: owns its states and hardware, first-true-wins transitions
//! - **TrajectoryTracker**: time-indexed holonomic path following
//! - **ControlLoop**: ticks all subsystems with per-subsystem fault isolation
//!
//! # Example
//!
//! ```rust
//! use tickwise::builder::StateMachineBuilder;
//! use tickwise::core::{Activation, State, Transitions};
//! use tickwise::state_enum;
//!
//! state_enum! {
//!     enum ClawState {
//!         Open,
//!         Closed,
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Claw {
//!     solenoid: bool,
//! }
//!
//! struct Inputs {
//!     trigger: bool,
//! }
//!
//! struct Open;
//! struct Closed;
//!
//! impl State<ClawState, Claw, Inputs> for Open {
//!     fn build(&self, transitions: &mut Transitions<ClawState, Claw, Inputs>) {
//!         transitions.on(ClawState::Closed, |i: &Inputs| i.trigger);
//!     }
//!
//!     fn execute(&mut self, claw: &mut Claw, _: &Inputs) {
//!         claw.solenoid = false;
//!     }
//! }
//!
//! impl State<ClawState, Claw, Inputs> for Closed {
//!     fn build(&self, transitions: &mut Transitions<ClawState, Claw, Inputs>) {
//!         transitions.on(ClawState::Open, |i: &Inputs| !i.trigger);
//!     }
//!
//!     fn init(&mut self, claw: &mut Claw, _: &Inputs, _: ClawState) -> Activation<ClawState> {
//!         claw.solenoid = true;
//!         Activation::Continue
//!     }
//!
//!     fn execute(&mut self, _: &mut Claw, _: &Inputs) {}
//! }
//!
//! let mut claw = StateMachineBuilder::new("claw")
//!     .state(ClawState::Open, Open)
//!     .state(ClawState::Closed, Closed)
//!     .initial(ClawState::Open)
//!     .build(Claw::default())
//!     .unwrap();
//!
//! let arm_view = claw.observer();
//!
//! claw.tick(&Inputs { trigger: true });
//! assert!(claw.context().solenoid);
//! assert!(arm_view.is_in(ClawState::Closed));
//! ```

pub mod builder;
pub mod config;
pub mod control;
pub mod core;
pub mod machine;
pub mod runtime;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use core::{Activation, Guard, State, StateHistory, StateKey, StateTransition, Transitions};
pub use machine::{StateMachine, StateObserver, TickOutcome};
