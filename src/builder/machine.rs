//! Builder for constructing state machines.

use crate::builder::error::{BuildError, ConfigViolation};
use crate::core::{State, StateHistory, StateKey, Transitions, DEFAULT_HISTORY_CAPACITY};
use crate::machine::{Slot, StateMachine};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{error, warn};

/// Builder for constructing state machines with a fluent API.
///
/// States are registered first and only then asked to `build()` their
/// transitions, so a state may target any other registered state,
/// including ones registered after it.
pub struct StateMachineBuilder<K: StateKey, Ctx, I> {
    name: String,
    states: Vec<(K, Box<dyn State<K, Ctx, I>>)>,
    initial: Option<K>,
    history_capacity: usize,
}

impl<K: StateKey, Ctx: 'static, I: 'static> StateMachineBuilder<K, Ctx, I> {
    /// Create a builder for the machine of subsystem `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            initial: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Register the behaviour for `key`.
    pub fn state<S>(mut self, key: K, state: S) -> Self
    where
        S: State<K, Ctx, I> + 'static,
    {
        self.states.push((key, Box::new(state)));
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, key: K) -> Self {
        self.initial = Some(key);
        self
    }

    /// Number of transitions the machine's history retains.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Build the machine around the subsystem handle `context`.
    ///
    /// Calls `build()` exactly once on every registered state, then
    /// validates the transition graph and reports every violation found.
    /// The initial state is made current without running its `init()`.
    pub fn build(self, context: Ctx) -> Result<StateMachine<K, Ctx, I>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let slots: Vec<Slot<K, Ctx, I>> = self
            .states
            .into_iter()
            .map(|(key, state)| {
                let mut transitions = Transitions::new();
                state.build(&mut transitions);
                Slot {
                    key,
                    state,
                    transitions,
                }
            })
            .collect();

        if let Validation::Failure(violations) = validate_graph(&slots, initial) {
            let violations: Vec<ConfigViolation> = violations.iter().cloned().collect();
            for violation in &violations {
                error!(machine = %self.name, "{}", violation);
            }
            return Err(BuildError::InvalidGraph {
                machine: self.name,
                violations,
            });
        }

        let Some(initial_index) = slots.iter().position(|slot| slot.key == initial) else {
            return Err(BuildError::InvalidGraph {
                machine: self.name,
                violations: vec![ConfigViolation::UnknownInitialState {
                    state: initial.name().to_string(),
                }],
            });
        };

        for unreachable in unreachable_states(&slots, initial) {
            warn!(
                machine = %self.name,
                state = unreachable.name(),
                "state is not reachable from the initial state"
            );
        }

        let history = StateHistory::with_capacity(self.history_capacity);
        Ok(StateMachine::from_parts(
            self.name,
            slots,
            initial_index,
            context,
            history,
        ))
    }
}

/// Check the whole graph, accumulating ALL violations.
fn validate_graph<K: StateKey, Ctx, I>(
    slots: &[Slot<K, Ctx, I>],
    initial: K,
) -> Validation<(), NonEmptyVec<ConfigViolation>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<ConfigViolation>>> = Vec::new();
    let mut registered = HashSet::new();

    for slot in slots {
        let check = if registered.insert(slot.key) {
            Validation::success(())
        } else {
            Validation::fail(ConfigViolation::DuplicateState {
                state: slot.key.name().to_string(),
            })
        };
        checks.push(check);
    }

    let initial_check = if registered.contains(&initial) {
        Validation::success(())
    } else {
        Validation::fail(ConfigViolation::UnknownInitialState {
            state: initial.name().to_string(),
        })
    };
    checks.push(initial_check);

    for slot in slots {
        for target in slot.transitions.targets() {
            if !registered.contains(&target) {
                checks.push(Validation::fail(ConfigViolation::UnknownTarget {
                    from: slot.key.name().to_string(),
                    to: target.name().to_string(),
                }));
            }
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Registered states no chain of transitions leads to from `initial`.
fn unreachable_states<K: StateKey, Ctx, I>(slots: &[Slot<K, Ctx, I>], initial: K) -> Vec<K> {
    let mut reached = HashSet::from([initial]);
    let mut frontier = vec![initial];

    while let Some(state) = frontier.pop() {
        let targets = slots
            .iter()
            .filter(|slot| slot.key == state)
            .flat_map(|slot| slot.transitions.targets());
        for target in targets {
            if reached.insert(target) {
                frontier.push(target);
            }
        }
    }

    slots
        .iter()
        .map(|slot| slot.key)
        .filter(|key| !reached.contains(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum ArmState {
        Idle,
        ScoreHigh,
        Scoring,
        Stowed,
    }

    impl StateKey for ArmState {
        fn name(&self) -> &'static str {
            match self {
                Self::Idle => "Idle",
                Self::ScoreHigh => "ScoreHigh",
                Self::Scoring => "Scoring",
                Self::Stowed => "Stowed",
            }
        }
    }

    struct Mode {
        targets: Vec<ArmState>,
        builds: Arc<AtomicUsize>,
    }

    impl Mode {
        fn to(targets: &[ArmState]) -> Self {
            Self {
                targets: targets.to_vec(),
                builds: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl State<ArmState, (), bool> for Mode {
        fn build(&self, transitions: &mut Transitions<ArmState, (), bool>) {
            self.builds.fetch_add(1, Ordering::SeqCst);
            for &target in &self.targets {
                transitions.on(target, |pressed: &bool| *pressed);
            }
        }

        fn execute(&mut self, _ctx: &mut (), _inputs: &bool) {}
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = StateMachineBuilder::<ArmState, (), bool>::new("arm")
            .state(ArmState::Idle, Mode::to(&[]))
            .build(());

        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn builder_requires_states() {
        let result = StateMachineBuilder::<ArmState, (), bool>::new("arm")
            .initial(ArmState::Idle)
            .build(());

        assert!(matches!(result, Err(BuildError::NoStates)));
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let result = StateMachineBuilder::new("arm")
            .state(ArmState::Idle, Mode::to(&[ArmState::ScoreHigh]))
            .state(ArmState::Idle, Mode::to(&[]))
            .state(ArmState::Scoring, Mode::to(&[ArmState::Stowed]))
            .initial(ArmState::Stowed)
            .build(());

        match result {
            Err(BuildError::InvalidGraph {
                machine,
                violations,
            }) => {
                assert_eq!(machine, "arm");
                assert_eq!(violations.len(), 4);
                assert!(violations.contains(&ConfigViolation::DuplicateState {
                    state: "Idle".to_string()
                }));
                assert!(violations.contains(&ConfigViolation::UnknownInitialState {
                    state: "Stowed".to_string()
                }));
                assert!(violations.contains(&ConfigViolation::UnknownTarget {
                    from: "Idle".to_string(),
                    to: "ScoreHigh".to_string()
                }));
                assert!(violations.contains(&ConfigViolation::UnknownTarget {
                    from: "Scoring".to_string(),
                    to: "Stowed".to_string()
                }));
            }
            Err(other) => panic!("Expected InvalidGraph, got {other}"),
            Ok(_) => panic!("Expected InvalidGraph, got a machine"),
        }
    }

    #[test]
    fn build_is_called_once_per_state() {
        let idle = Mode::to(&[ArmState::ScoreHigh]);
        let score = Mode::to(&[ArmState::Idle]);
        let idle_builds = Arc::clone(&idle.builds);
        let score_builds = Arc::clone(&score.builds);

        let machine = StateMachineBuilder::new("arm")
            .state(ArmState::Idle, idle)
            .state(ArmState::ScoreHigh, score)
            .initial(ArmState::Idle)
            .build(());

        assert!(machine.is_ok());
        assert_eq!(idle_builds.load(Ordering::SeqCst), 1);
        assert_eq!(score_builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn forward_references_resolve() {
        let machine = StateMachineBuilder::new("arm")
            .state(ArmState::Idle, Mode::to(&[ArmState::Scoring]))
            .state(ArmState::Scoring, Mode::to(&[ArmState::Idle]))
            .initial(ArmState::Idle)
            .history_capacity(4)
            .build(())
            .unwrap();

        assert_eq!(machine.current_state(), ArmState::Idle);
        assert_eq!(machine.history().capacity(), 4);
    }

    #[test]
    fn unreachable_states_are_reported() {
        let slots = vec![
            Slot {
                key: ArmState::Idle,
                state: Box::new(Mode::to(&[])) as Box<dyn State<ArmState, (), bool>>,
                transitions: {
                    let mut t = Transitions::new();
                    t.on(ArmState::Scoring, |b: &bool| *b);
                    t
                },
            },
            Slot {
                key: ArmState::Scoring,
                state: Box::new(Mode::to(&[])),
                transitions: Transitions::new(),
            },
            Slot {
                key: ArmState::Stowed,
                state: Box::new(Mode::to(&[])),
                transitions: Transitions::new(),
            },
        ];

        assert_eq!(unreachable_states(&slots, ArmState::Idle), vec![ArmState::Stowed]);
        assert!(validate_graph(&slots, ArmState::Idle).is_success());
    }
}
