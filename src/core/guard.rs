//! Guard predicates for controlling state transitions.
//!
//! Guards only ever see shared references: the subsystem handle and the
//! input snapshot of the current tick. A guard cannot command hardware or
//! change the snapshot, so evaluating it any number of times has no effect
//! on the robot.

/// Pure predicate that decides whether a transition fires this tick.
///
/// # Example
///
/// ```rust
/// use tickwise::core::Guard;
///
/// struct Inputs {
///     idle_button: bool,
/// }
///
/// let idle_pressed: Guard<(), Inputs> = Guard::from_inputs(|i: &Inputs| i.idle_button);
///
/// assert!(idle_pressed.check(&(), &Inputs { idle_button: true }));
/// assert!(!idle_pressed.check(&(), &Inputs { idle_button: false }));
/// ```
pub struct Guard<Ctx, I> {
    predicate: Box<dyn Fn(&Ctx, &I) -> bool + Send + Sync>,
}

impl<Ctx: 'static, I: 'static> Guard<Ctx, I> {
    /// Create a guard that reads both the subsystem handle and the inputs.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Ctx, &I) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Create a guard that only reads the input snapshot.
    pub fn from_inputs<F>(predicate: F) -> Self
    where
        F: Fn(&I) -> bool + Send + Sync + 'static,
    {
        Self::new(move |_, inputs| predicate(inputs))
    }

    /// Create a guard from a predicate that may not know the answer.
    ///
    /// `None` (sensor unplugged, no target in view) evaluates to `false`,
    /// so the machine stays where it is.
    ///
    /// ```rust
    /// use tickwise::core::Guard;
    ///
    /// struct Inputs {
    ///     distance_m: Option<f64>,
    /// }
    ///
    /// let close: Guard<(), Inputs> =
    ///     Guard::when_known(|_: &(), i: &Inputs| i.distance_m.map(|d| d < 0.5));
    ///
    /// assert!(close.check(&(), &Inputs { distance_m: Some(0.2) }));
    /// assert!(!close.check(&(), &Inputs { distance_m: None }));
    /// ```
    pub fn when_known<F>(predicate: F) -> Self
    where
        F: Fn(&Ctx, &I) -> Option<bool> + Send + Sync + 'static,
    {
        Self::new(move |ctx, inputs| predicate(ctx, inputs).unwrap_or(false))
    }

    /// Guard that fires on every evaluation.
    pub fn always() -> Self {
        Self::new(|_, _| true)
    }

    /// Guard that never fires.
    pub fn never() -> Self {
        Self::new(|_, _| false)
    }
}

impl<Ctx, I> Guard<Ctx, I> {
    /// Evaluate the predicate.
    pub fn check(&self, ctx: &Ctx, inputs: &I) -> bool {
        (self.predicate)(ctx, inputs)
    }
}

impl<Ctx, I> std::fmt::Debug for Guard<Ctx, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Guard")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Arm {
        at_target: bool,
    }

    struct Inputs {
        trigger: f64,
        color: Option<u8>,
    }

    fn inputs(trigger: f64) -> Inputs {
        Inputs {
            trigger,
            color: None,
        }
    }

    #[test]
    fn guard_reads_inputs() {
        let guard: Guard<Arm, Inputs> = Guard::from_inputs(|i: &Inputs| i.trigger > 0.25);
        let arm = Arm { at_target: false };

        assert!(guard.check(&arm, &inputs(0.5)));
        assert!(!guard.check(&arm, &inputs(0.1)));
    }

    #[test]
    fn guard_reads_context() {
        let guard: Guard<Arm, Inputs> = Guard::new(|arm: &Arm, _: &Inputs| arm.at_target);

        assert!(guard.check(&Arm { at_target: true }, &inputs(0.0)));
        assert!(!guard.check(&Arm { at_target: false }, &inputs(0.0)));
    }

    #[test]
    fn unknown_answer_is_false() {
        let guard: Guard<Arm, Inputs> = Guard::when_known(|_: &Arm, i: &Inputs| i.color.map(|c| c == 1));
        let arm = Arm { at_target: false };

        assert!(!guard.check(&arm, &inputs(0.0)));
        assert!(guard.check(
            &arm,
            &Inputs {
                trigger: 0.0,
                color: Some(1)
            }
        ));
        assert!(!guard.check(
            &arm,
            &Inputs {
                trigger: 0.0,
                color: Some(2)
            }
        ));
    }

    #[test]
    fn constant_guards() {
        let arm = Arm { at_target: false };
        assert!(Guard::<Arm, Inputs>::always().check(&arm, &inputs(0.0)));
        assert!(!Guard::<Arm, Inputs>::never().check(&arm, &inputs(0.0)));
    }

    #[test]
    fn guard_is_deterministic() {
        let guard: Guard<Arm, Inputs> = Guard::from_inputs(|i: &Inputs| i.trigger > 0.25);
        let arm = Arm { at_target: false };
        let snapshot = inputs(0.3);

        let result1 = guard.check(&arm, &snapshot);
        let result2 = guard.check(&arm, &snapshot);

        assert_eq!(result1, result2);
    }
}
