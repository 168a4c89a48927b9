//! Anything the control loop can tick.

use crate::core::StateKey;
use crate::machine::{StateMachine, StateObserver};

/// One independently ticked part of the robot.
pub trait Subsystem: Send {
    /// Name used in logs and fault reports.
    fn name(&self) -> &str;

    /// Run one control cycle. Must not block.
    fn tick(&mut self);
}

/// A state machine paired with the function that reads its inputs.
///
/// Each tick samples a fresh input snapshot and hands it to the machine, so
/// guards and hooks all see the same values for the whole cycle.
///
/// # Example
/// ```
/// use tickwise::builder::StateMachineBuilder;
/// use tickwise::core::{State, Transitions};
/// use tickwise::runtime::{MachineSubsystem, Subsystem};
/// use tickwise::state_enum;
///
/// state_enum! {
///     enum Led {
///         Off,
///         On,
///     }
/// }
///
/// struct Follow(Led);
///
/// impl State<Led, (), bool> for Follow {
///     fn build(&self, transitions: &mut Transitions<Led, (), bool>) {
///         match self.0 {
///             Led::Off => transitions.on(Led::On, |pressed: &bool| *pressed),
///             Led::On => transitions.on(Led::Off, |pressed: &bool| !*pressed),
///         };
///     }
///
///     fn execute(&mut self, _: &mut (), _: &bool) {}
/// }
///
/// let machine = StateMachineBuilder::new("leds")
///     .state(Led::Off, Follow(Led::Off))
///     .state(Led::On, Follow(Led::On))
///     .initial(Led::Off)
///     .build(())
///     .unwrap();
///
/// let mut leds = MachineSubsystem::new(machine, || true);
/// leds.tick();
/// assert_eq!(leds.machine().current_state(), Led::On);
/// ```
pub struct MachineSubsystem<K: StateKey, Ctx, I, F> {
    machine: StateMachine<K, Ctx, I>,
    inputs: F,
}

impl<K, Ctx, I, F> MachineSubsystem<K, Ctx, I, F>
where
    K: StateKey,
    F: FnMut() -> I,
{
    pub fn new(machine: StateMachine<K, Ctx, I>, inputs: F) -> Self {
        Self { machine, inputs }
    }

    pub fn machine(&self) -> &StateMachine<K, Ctx, I> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StateMachine<K, Ctx, I> {
        &mut self.machine
    }

    pub fn observer(&self) -> StateObserver<K> {
        self.machine.observer()
    }

    pub fn into_machine(self) -> StateMachine<K, Ctx, I> {
        self.machine
    }
}

impl<K, Ctx, I, F> Subsystem for MachineSubsystem<K, Ctx, I, F>
where
    K: StateKey,
    Ctx: Send,
    F: FnMut() -> I + Send,
{
    fn name(&self) -> &str {
        self.machine.name()
    }

    fn tick(&mut self) {
        let inputs = (self.inputs)();
        self.machine.tick(&inputs);
    }
}
