use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Time source consumed by the limiter.
///
/// Readings are expressed as the time elapsed since the clock's origin and
/// must be monotonic: wall clock adjustments must never be observable in the
/// difference of two readings. `sleep` suspends the calling thread for at
/// least the given duration.
///
/// Implementations must be `Send` and `Sync`; a single clock instance is read
/// by every thread sharing a limiter.
pub trait Clock: Debug + Send + Sync {
    /// Returns the monotonic time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Suspends the calling thread for at least `duration`.
    fn sleep(&self, duration: Duration);
}

/// Production clock backed by [`quanta`].
///
/// The origin is captured when the clock is created; readings are the
/// monotonic distance from that anchor. Sleeping delegates to the OS.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    inner: quanta::Clock,
    anchor: quanta::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let inner = quanta::Clock::new();
        let anchor = inner.now();
        Self { inner, anchor }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.inner.now().duration_since(self.anchor)
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock for tests: time only moves when told to.
///
/// `sleep` advances the clock instead of suspending the caller, so code paced
/// against a `ManualClock` runs instantly while still observing the exact
/// scheduling arithmetic. Clones share the same underlying time, which lets a
/// test keep a handle while the limiter owns its copy.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed_ns: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward without a sleeper, simulating a caller that stayed
    /// away for `duration`.
    pub fn advance(&self, duration: Duration) {
        self.elapsed_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::Acquire))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_reports_monotonic_time() {
        let clock = MonotonicClock::new();

        let a = clock.now();
        let b = clock.now();
        assert!(b >= a, "monotonic readings must never run backwards");
    }

    #[test]
    fn test_monotonic_sleep_suspends_for_at_least_the_duration() {
        let clock = MonotonicClock::new();
        let nap = Duration::from_millis(5);

        let before = clock.now();
        clock.sleep(nap);
        let after = clock.now();

        assert!(
            after - before >= nap,
            "slept {:?}, expected at least {:?}",
            after - before,
            nap
        );
    }

    #[test]
    fn test_manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_manual_sleep_advances_instead_of_blocking() {
        let clock = ManualClock::new();

        clock.sleep(Duration::from_secs(3600));
        assert_eq!(clock.now(), Duration::from_secs(3600));
    }

    #[test]
    fn test_manual_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }
}
