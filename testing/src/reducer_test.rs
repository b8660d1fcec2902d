//! Given/When/Then harness for reducers.
//!
//! `when_action` runs the reducer eagerly, so every `then_*` assertion
//! executes against the captured outcome as soon as it is declared; `run()`
//! just marks the end of the chain.

use storekit_core::SmallVec;
use storekit_core::effect::Effect;
use storekit_core::reducer::Reducer;

/// Entry point of the harness: collects the reducer, environment, and
/// starting state, then hands off to [`ReducerRun`]
///
/// # Example
///
/// ```ignore
/// use storekit_testing::ReducerTest;
///
/// ReducerTest::new(CatalogReducer::new())
///     .with_env(test_environment())
///     .given_state(CatalogState::default())
///     .when_action(CatalogAction::ClearError)
///     .then_state(|state| {
///         assert!(state.error.is_none());
///     })
///     .then_effects(|effects| {
///         assert!(effects.is_empty());
///     })
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    environment: Option<R::Environment>,
    state: Option<R::State>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
{
    /// Create a harness for the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            state: None,
        }
    }

    /// Provide the environment the reducer will see
    #[must_use]
    pub fn with_env(mut self, environment: R::Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Provide the starting state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// Run the reducer with the given action (When) and capture the outcome
    ///
    /// # Panics
    ///
    /// Panics if the environment or starting state was not provided.
    #[allow(clippy::expect_used)] // Misuse of the harness should fail loudly
    pub fn when_action(self, action: R::Action) -> ReducerRun<R::State, R::Action> {
        let environment = self
            .environment
            .expect("environment must be set with with_env()");
        let mut state = self
            .state
            .expect("initial state must be set with given_state()");
        let effects = self.reducer.reduce(&mut state, action, &environment);
        ReducerRun { state, effects }
    }
}

/// Outcome of a single reducer invocation
pub struct ReducerRun<S, A> {
    /// State after the transition
    pub state: S,
    /// Effects the transition returned
    pub effects: SmallVec<[Effect<A>; 4]>,
}

impl<S, A> ReducerRun<S, A> {
    /// Assert on the resulting state (Then)
    #[must_use]
    pub fn then_state(self, assertion: impl FnOnce(&S)) -> Self {
        assertion(&self.state);
        self
    }

    /// Assert on the returned effects (Then)
    #[must_use]
    pub fn then_effects(self, assertion: impl FnOnce(&[Effect<A>])) -> Self {
        assertion(&self.effects);
        self
    }

    /// Finish the chain
    ///
    /// All assertions have already executed; this only consumes the run so
    /// chains read Given/When/Then/run.
    pub fn run(self) {}
}

/// Helper assertions for effects
pub mod assertions {
    use storekit_core::effect::Effect;

    /// Assert that the transition produced no observable effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        let observable = effects
            .iter()
            .filter(|e| !matches!(e, Effect::None))
            .count();
        assert!(
            observable == 0,
            "Expected no effects, found {observable}: {effects:?}"
        );
    }

    /// Assert the exact number of effects
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert!(
            effects.len() == expected,
            "Expected {expected} effects, found {}",
            effects.len()
        );
    }

    /// Assert that at least one `Effect::Future` was returned
    ///
    /// # Panics
    ///
    /// Panics if no future effect is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected a Future effect, found none"
        );
    }

    /// Assert that at least one `Effect::Delay` was returned
    ///
    /// # Panics
    ///
    /// Panics if no delay effect is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "Expected a Delay effect, found none"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storekit_core::smallvec;

    #[derive(Clone, Debug)]
    struct TallyState {
        total: i32,
    }

    #[derive(Clone, Debug)]
    enum TallyAction {
        Add(i32),
        Reset,
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = TallyState;
        type Action = TallyAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            (): &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TallyAction::Add(n) => {
                    state.total += n;
                    smallvec![]
                },
                TallyAction::Reset => {
                    state.total = 0;
                    smallvec![Effect::None]
                },
            }
        }
    }

    #[test]
    fn harness_exposes_state_and_effects() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(TallyState { total: 40 })
            .when_action(TallyAction::Add(2))
            .then_state(|state| assert_eq!(state.total, 42))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn outcome_fields_are_directly_accessible() {
        let run = ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(TallyState { total: 7 })
            .when_action(TallyAction::Reset);
        assert_eq!(run.state.total, 0);
        assert_eq!(run.effects.len(), 1);
    }

    #[test]
    fn no_effects_assertion_tolerates_explicit_none() {
        assertions::assert_no_effects::<TallyAction>(&[Effect::None]);
        assertions::assert_no_effects::<TallyAction>(&[]);
        assertions::assert_effects_count::<TallyAction>(&[Effect::None], 1);
    }
}
