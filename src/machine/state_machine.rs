//! Tick-driven state machine owning one subsystem's states and hardware.

use crate::core::{Activation, State, StateHistory, StateKey, StateTransition, Transitions};
use crate::machine::error::MachineError;
use crate::machine::observer::StateObserver;
use crate::snapshot::MachineSnapshot;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome<K> {
    /// No guard fired; the current state executed again.
    Stayed(K),

    /// A guard fired. `to` is the state that executed this tick, which is
    /// the fallback state if the entered state fell back during `init()`.
    Transitioned { from: K, to: K },
}

impl<K: Copy> TickOutcome<K> {
    /// State that was current when the tick finished.
    pub fn current(&self) -> K {
        match *self {
            Self::Stayed(state) => state,
            Self::Transitioned { to, .. } => to,
        }
    }

    pub fn transitioned(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }
}

/// A registered state together with the transitions it declared in `build()`.
pub(crate) struct Slot<K, Ctx, I> {
    pub(crate) key: K,
    pub(crate) state: Box<dyn State<K, Ctx, I>>,
    pub(crate) transitions: Transitions<K, Ctx, I>,
}

/// Finite state machine for one subsystem.
///
/// The machine owns its states (in an arena indexed by position), the
/// subsystem handle `Ctx` passed to every hook, and the index of the single
/// current state. Construct it with
/// [`StateMachineBuilder`](crate::builder::StateMachineBuilder).
///
/// # Example
///
/// ```rust
/// use tickwise::builder::StateMachineBuilder;
/// use tickwise::core::{State, Transitions};
/// use tickwise::state_enum;
///
/// state_enum! {
///     enum LedState {
///         Cone,
///         Cube,
///     }
/// }
///
/// struct Toggle {
///     target: LedState,
/// }
///
/// impl State<LedState, u32, bool> for Toggle {
///     fn build(&self, transitions: &mut Transitions<LedState, u32, bool>) {
///         transitions.on(self.target, |pressed: &bool| *pressed);
///     }
///
///     fn execute(&mut self, frames: &mut u32, _pressed: &bool) {
///         *frames += 1;
///     }
/// }
///
/// let mut leds = StateMachineBuilder::new("leds")
///     .state(LedState::Cone, Toggle { target: LedState::Cube })
///     .state(LedState::Cube, Toggle { target: LedState::Cone })
///     .initial(LedState::Cone)
///     .build(0)
///     .unwrap();
///
/// leds.tick(&false);
/// assert_eq!(leds.current_state(), LedState::Cone);
///
/// leds.tick(&true);
/// assert_eq!(leds.current_state(), LedState::Cube);
/// assert_eq!(*leds.context(), 2);
/// ```
pub struct StateMachine<K: StateKey, Ctx, I> {
    name: String,
    slots: Vec<Slot<K, Ctx, I>>,
    index: HashMap<K, usize>,
    current: usize,
    context: Ctx,
    observer: StateObserver<K>,
    history: StateHistory<K>,
    ticks: u64,
}

impl<K: StateKey, Ctx, I> StateMachine<K, Ctx, I> {
    pub(crate) fn from_parts(
        name: String,
        slots: Vec<Slot<K, Ctx, I>>,
        initial: usize,
        context: Ctx,
        history: StateHistory<K>,
    ) -> Self {
        let keys: Arc<[K]> = slots.iter().map(|slot| slot.key).collect();
        let index = slots
            .iter()
            .enumerate()
            .map(|(position, slot)| (slot.key, position))
            .collect();

        Self {
            name,
            slots,
            index,
            current: initial,
            context,
            observer: StateObserver::new(keys, initial),
            history,
            ticks: 0,
        }
    }

    /// Advance the machine by one control cycle.
    ///
    /// 1. Evaluate the current state's transitions in declaration order.
    /// 2. If one fires: `exit(next)` on the current state, switch, `init(previous)`
    ///    on the new one.
    /// 3. `execute()` the (possibly new) current state.
    pub fn tick(&mut self, inputs: &I) -> TickOutcome<K> {
        self.ticks += 1;
        let from = self.current_state();

        let selected = self.slots[self.current]
            .transitions
            .select(&self.context, inputs);

        let outcome = match selected {
            Some(next) => {
                self.switch_to(next, inputs);
                TickOutcome::Transitioned {
                    from,
                    to: self.current_state(),
                }
            }
            None => TickOutcome::Stayed(from),
        };

        self.slots[self.current]
            .state
            .execute(&mut self.context, inputs);

        outcome
    }

    fn switch_to(&mut self, next: K, inputs: &I) {
        let mut target = next;

        // Each pass enters one state, so a chain of fallbacks is bounded by
        // the number of registered states.
        for _ in 0..self.slots.len() {
            let Some(&next_index) = self.index.get(&target) else {
                error!(
                    machine = %self.name,
                    state = target.name(),
                    "transition to unregistered state ignored"
                );
                return;
            };

            let previous = self.slots[self.current].key;
            self.slots[self.current]
                .state
                .exit(&mut self.context, inputs, target);

            self.current = next_index;
            self.observer.publish(next_index);
            self.history.record(StateTransition {
                from: previous,
                to: target,
                timestamp: Utc::now(),
                tick: self.ticks,
            });
            debug!(
                machine = %self.name,
                from = previous.name(),
                to = target.name(),
                tick = self.ticks,
                "state transition"
            );

            let activation = self.slots[next_index]
                .state
                .init(&mut self.context, inputs, previous);

            match activation {
                Activation::Continue => return,
                Activation::FallBack(fallback) => {
                    warn!(
                        machine = %self.name,
                        state = target.name(),
                        fallback = fallback.name(),
                        "state fell back during init"
                    );
                    target = fallback;
                }
            }
        }

        error!(
            machine = %self.name,
            state = self.current_state().name(),
            "fallback chain did not settle"
        );
    }

    /// Force the current state without running `exit()` or `init()`.
    ///
    /// Reserved for explicit recovery paths: the state being left does not
    /// get the chance to safe its hardware.
    pub fn set_current_state(&mut self, state: K) -> Result<(), MachineError> {
        let Some(&index) = self.index.get(&state) else {
            return Err(MachineError::UnknownState {
                machine: self.name.clone(),
                state: state.name().to_string(),
            });
        };

        let previous = self.current_state();
        warn!(
            machine = %self.name,
            from = previous.name(),
            to = state.name(),
            "state forced without exit/init"
        );

        self.current = index;
        self.history.record(StateTransition {
            from: previous,
            to: state,
            timestamp: Utc::now(),
            tick: self.ticks,
        });
        self.observer.publish(index);
        Ok(())
    }

    /// Current state (pure).
    pub fn current_state(&self) -> K {
        self.slots[self.current].key
    }

    pub fn is_in(&self, state: K) -> bool {
        self.current_state() == state
    }

    /// Handle for sibling subsystems to poll this machine's state.
    pub fn observer(&self) -> StateObserver<K> {
        self.observer.clone()
    }

    /// Registered states in registration order.
    pub fn states(&self) -> impl Iterator<Item = K> + '_ {
        self.slots.iter().map(|slot| slot.key)
    }

    /// The subsystem handle lent to every hook.
    pub fn context(&self) -> &Ctx {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Ctx {
        &mut self.context
    }

    pub fn history(&self) -> &StateHistory<K> {
        &self.history
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serializable record of the machine's current state and history.
    pub fn snapshot(&self) -> MachineSnapshot<K> {
        MachineSnapshot::new(
            self.name.clone(),
            self.current_state(),
            self.ticks,
            self.history.clone(),
        )
    }
}
