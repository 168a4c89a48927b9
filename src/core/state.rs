//! State identities and the lifecycle trait every subsystem mode implements.
//!
//! A state machine separates *who* a state is from *what* it does:
//!
//! - [`StateKey`] is the identity: a small `Copy` value (usually an enum)
//!   that other subsystems compare against and that transitions target.
//! - [`State`] is the behaviour: the four lifecycle operations run by the
//!   machine while that key is current.

use super::transition::Transitions;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Identity of a state inside one state machine.
///
/// Keys are compared by value, so reading another subsystem's current state
/// is a plain equality check on a `Copy` value.
///
/// # Example
///
/// ```rust
/// use tickwise::core::StateKey;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum ClawState {
///     Open,
///     ClosedCone,
///     ClosedCube,
/// }
///
/// impl StateKey for ClawState {
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Open => "Open",
///             Self::ClosedCone => "ClosedCone",
///             Self::ClosedCube => "ClosedCube",
///         }
///     }
/// }
///
/// assert_eq!(ClawState::ClosedCone.name(), "ClosedCone");
/// ```
pub trait StateKey:
    Copy + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Name used in logs and snapshots.
    fn name(&self) -> &'static str;
}

/// What a state asks the machine to do right after its `init()` ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation<K> {
    /// Stay in the state that was just entered.
    Continue,

    /// The state cannot act on the data it was given (no game piece seen,
    /// no pose estimate, ...). The machine leaves it again and enters the
    /// named safe state with the usual exit/init hooks.
    FallBack(K),
}

/// Behaviour of one operating mode of a subsystem.
///
/// `K` is the machine's key type, `Ctx` the subsystem's exclusively owned
/// hardware handle and `I` the read-only input snapshot handed to every
/// tick.
///
/// # Lifecycle
///
/// 1. `build()` - once, when the machine is constructed
/// 2. `init()` - once per activation
/// 3. `execute()` - every tick while current, including the tick it was entered on
/// 4. `exit()` - once per deactivation
///
/// `exit()` must leave the hardware in a condition any other state can
/// take over from: motors stopped, integrators cleared.
pub trait State<K: StateKey, Ctx, I>: Send {
    /// Declare the outgoing transitions in priority order.
    fn build(&self, transitions: &mut Transitions<K, Ctx, I>);

    /// Called when the machine switches into this state.
    fn init(&mut self, _ctx: &mut Ctx, _inputs: &I, _previous: K) -> Activation<K> {
        Activation::Continue
    }

    /// Called once per tick while this state is current.
    fn execute(&mut self, ctx: &mut Ctx, inputs: &I);

    /// Called when the machine switches away from this state.
    fn exit(&mut self, _ctx: &mut Ctx, _inputs: &I, _next: K) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Moving,
    }

    impl StateKey for TestState {
        fn name(&self) -> &'static str {
            match self {
                Self::Idle => "Idle",
                Self::Moving => "Moving",
            }
        }
    }

    struct Counting {
        executed: usize,
    }

    impl State<TestState, (), ()> for Counting {
        fn build(&self, transitions: &mut Transitions<TestState, (), ()>) {
            transitions.on(TestState::Moving, |_| true);
        }

        fn execute(&mut self, _ctx: &mut (), _inputs: &()) {
            self.executed += 1;
        }
    }

    #[test]
    fn state_key_name_returns_correct_value() {
        assert_eq!(TestState::Idle.name(), "Idle");
        assert_eq!(TestState::Moving.name(), "Moving");
    }

    #[test]
    fn state_key_serializes_correctly() {
        let json = serde_json::to_string(&TestState::Moving).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, TestState::Moving);
    }

    #[test]
    fn default_init_continues() {
        let mut state = Counting { executed: 0 };
        let activation = state.init(&mut (), &(), TestState::Idle);
        assert_eq!(activation, Activation::Continue);
    }

    #[test]
    fn build_declares_transitions() {
        let state = Counting { executed: 0 };
        let mut transitions = Transitions::new();
        state.build(&mut transitions);

        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions.targets().collect::<Vec<_>>(), vec![TestState::Moving]);
    }

    #[test]
    fn execute_runs_state_work() {
        let mut state = Counting { executed: 0 };
        state.execute(&mut (), &());
        state.execute(&mut (), &());
        assert_eq!(state.executed, 2);
    }
}
