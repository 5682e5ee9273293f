//! # pace-limit
//!
//! `pace-limit` provides a high-performance, lock-free request pacer.
//!
//! ## Core Philosophy
//!
//! Most rate limiters answer "may this request proceed right now?" and force
//! the caller to handle rejection. `pace-limit` answers a different question:
//! "when is it this caller's turn?" — and then blocks until that moment. It
//! is a leaky bucket in which nothing is ever dropped; bursts are absorbed by
//! stretching them out until completions are spaced `period / rate` apart.
//!
//! The shared scheduling state is a single immutable record behind an
//! atomically swapped reference. Callers advance it with a Compare-And-Swap
//! (CAS) retry loop, so there is no `Mutex` and no queue in the hot path.
//!
//! ## Key Concepts
//!
//! * **Pacing, not policing**: [`LeakyBucket::wait`] always admits the
//!   caller, after exactly the delay needed to hold the configured rate.
//! * **Lock-Free**: contention is resolved by re-reading fresh time and
//!   state, never by serializing behind a lock.
//! * **Pluggable time**: the [`Clock`] trait supplies `now` and `sleep`, so
//!   tests can drive the limiter deterministically with a [`ManualClock`].
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use pace_limit::LeakyBucket;
//!
//! let pacer = LeakyBucket::new(50, Duration::from_secs(1)).expect("valid rate");
//!
//! // The first admission is immediate; every one after it is spaced
//! // at least 20ms from the previous admission.
//! let first = pacer.wait();
//! let second = pacer.wait();
//! assert!(second - first >= Duration::from_millis(20));
//! ```

mod clock;
mod leaky_bucket;

pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::MonotonicClock;
pub use leaky_bucket::LeakyBucket;

/// Errors produced when configuring a limiter.
///
/// Construction is the only fallible operation; once a limiter exists,
/// [`LeakyBucket::wait`] has no failure path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The requested rate was zero, which would leave the per-operation
    /// interval undefined.
    #[error("rate must be greater than zero")]
    ZeroRate,

    /// The pacing period was zero, which would admit operations with no
    /// spacing at all.
    #[error("period must be greater than zero")]
    ZeroPeriod,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_basic_pacing() {
        let clock = ManualClock::new();
        let pacer =
            LeakyBucket::with_clock(4, Duration::from_secs(1), clock).expect("valid config");

        let first = pacer.wait();
        let second = pacer.wait();

        assert_eq!(second - first, Duration::from_millis(250));
    }

    #[test]
    fn test_default_clock_construction() {
        let pacer = LeakyBucket::new(1000, Duration::from_secs(1)).expect("valid config");
        assert_eq!(pacer.interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_config_errors_are_descriptive() {
        assert_eq!(
            LeakyBucket::new(0, Duration::from_secs(1)).unwrap_err(),
            ConfigError::ZeroRate
        );
        assert_eq!(
            ConfigError::ZeroRate.to_string(),
            "rate must be greater than zero"
        );
        assert_eq!(
            ConfigError::ZeroPeriod.to_string(),
            "period must be greater than zero"
        );
    }
}
