//! Driving every subsystem's machine once per control cycle.
//!
//! A [`ControlLoop`] owns the registered [`Subsystem`]s and ticks them in
//! registration order. A panic inside one subsystem's tick is caught and
//! logged; the remaining subsystems still run that cycle and every cycle
//! after it.

mod control_loop;
mod subsystem;

pub use control_loop::{
    ControlLoop, ControlLoopConfig, ControlLoopStats, CycleReport, MAX_RATE_HZ, MIN_RATE_HZ,
};
pub use subsystem::{MachineSubsystem, Subsystem};
