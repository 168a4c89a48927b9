//! Transitions and the ordered transition table a state declares in `build()`.

use super::guard::Guard;
use super::state::StateKey;

/// A guard paired with the state it leads to.
pub struct Transition<K, Ctx, I> {
    guard: Guard<Ctx, I>,
    target: K,
}

impl<K: StateKey, Ctx, I> Transition<K, Ctx, I> {
    pub fn new(guard: Guard<Ctx, I>, target: K) -> Self {
        Self { guard, target }
    }

    /// State entered when this transition fires.
    pub fn target(&self) -> K {
        self.target
    }

    /// Check whether the transition fires for this tick (pure).
    pub fn evaluate(&self, ctx: &Ctx, inputs: &I) -> bool {
        self.guard.check(ctx, inputs)
    }
}

/// Outgoing transitions of one state, in declaration order.
///
/// Declaration order is priority order: when several guards are true in the
/// same tick, the one declared first wins. Declare abort-style transitions
/// before normal progress.
///
/// # Example
///
/// ```rust
/// use tickwise::core::Transitions;
/// use tickwise::state_enum;
///
/// state_enum! {
///     enum ArmState {
///         Idle,
///         ScoreMid,
///         Scoring,
///     }
/// }
///
/// struct Buttons {
///     idle: bool,
///     score: bool,
/// }
///
/// let mut transitions: Transitions<ArmState, (), Buttons> = Transitions::new();
/// transitions
///     .on(ArmState::Idle, |b: &Buttons| b.idle)
///     .on(ArmState::Scoring, |b: &Buttons| b.score);
///
/// let both = Buttons { idle: true, score: true };
/// assert_eq!(transitions.select(&(), &both), Some(ArmState::Idle));
///
/// let neither = Buttons { idle: false, score: false };
/// assert_eq!(transitions.select(&(), &neither), None);
/// ```
pub struct Transitions<K, Ctx, I> {
    entries: Vec<Transition<K, Ctx, I>>,
}

impl<K: StateKey, Ctx: 'static, I: 'static> Transitions<K, Ctx, I> {
    /// Add a transition whose guard reads the input snapshot.
    pub fn on<F>(&mut self, target: K, predicate: F) -> &mut Self
    where
        F: Fn(&I) -> bool + Send + Sync + 'static,
    {
        self.add(Transition::new(Guard::from_inputs(predicate), target))
    }

    /// Add a transition with a prepared guard.
    pub fn on_guard(&mut self, target: K, guard: Guard<Ctx, I>) -> &mut Self {
        self.add(Transition::new(guard, target))
    }
}

impl<K: StateKey, Ctx, I> Transitions<K, Ctx, I> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a transition after every transition declared so far.
    pub fn add(&mut self, transition: Transition<K, Ctx, I>) -> &mut Self {
        self.entries.push(transition);
        self
    }

    /// Target of the first transition whose guard is true, if any.
    pub fn select(&self, ctx: &Ctx, inputs: &I) -> Option<K> {
        self.entries
            .iter()
            .find(|t| t.evaluate(ctx, inputs))
            .map(Transition::target)
    }

    /// Targets in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(Transition::target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: StateKey, Ctx, I> Default for Transitions<K, Ctx, I> {
    fn default() -> Self {
        Self::new()
    }
}
