//! # Storekit Testing
//!
//! Testing utilities and helpers for the Storekit architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A fluent Given/When/Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use storekit_testing::{ReducerTest, assertions, test_clock};
//!
//! ReducerTest::new(CatalogReducer::new())
//!     .with_env(test_environment())
//!     .given_state(CatalogState::default())
//!     .when_action(CatalogAction::ClearError)
//!     .then_state(|state| assert!(state.error.is_none()))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use storekit_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{ReducerRun, ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use storekit_testing::mocks::FixedClock;
    /// use storekit_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Advanceable clock for tests that cross time windows
    ///
    /// Starts at a given instant and only moves when `advance` is called,
    /// which makes cache-expiry behavior deterministic.
    ///
    /// # Example
    ///
    /// ```
    /// use storekit_testing::mocks::MockClock;
    /// use storekit_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = MockClock::new(Utc::now());
    /// let before = clock.now();
    /// clock.advance(Duration::minutes(6));
    /// assert_eq!(clock.now() - before, Duration::minutes(6));
    /// ```
    #[derive(Debug, Clone)]
    pub struct MockClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl MockClock {
        /// Create a new mock clock starting at the given time
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(start)),
            }
        }

        /// Move the clock forward by the given duration
        pub fn advance(&self, by: Duration) {
            let mut time = self
                .time
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            *self
                .time
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, MockClock, test_clock};
