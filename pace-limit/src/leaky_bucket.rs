use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::Clock;
use crate::ConfigError;
use crate::MonotonicClock;

/// Floor applied to computed sleep debt before it becomes an actual sleep.
/// Keeps the debt from degenerating to zero and letting a burst through with
/// no spacing at all. Overridable with [`LeakyBucket::with_slack`].
const DEFAULT_SLACK: Duration = Duration::from_nanos(10);

/// Scheduling record shared by every caller.
///
/// A record is immutable once published; `wait` replaces the whole record via
/// compare-and-swap, so no caller ever observes a half-written update.
#[derive(Debug)]
struct Tick {
    /// Scheduled time of the most recently admitted operation, relative to
    /// the clock origin. `None` until the first operation is admitted.
    last: Option<Duration>,
    /// Timing debt carried between updates. Spent, and reset to zero, once it
    /// is converted into a real sleep.
    sleep_for: Duration,
}

/// A leaky bucket that paces callers instead of rejecting them.
///
/// Every call to [`wait`](LeakyBucket::wait) blocks until it is the caller's
/// turn, so completions across all threads end up spaced `period / rate`
/// apart. Nothing is ever dropped; a burst is absorbed by stretching it out.
///
/// One instance is shared by all participating threads, typically via `Arc`.
/// Contention on the shared record is resolved by a CAS retry loop that
/// re-reads fresh time and state on every attempt, never by a lock.
#[derive(Debug)]
pub struct LeakyBucket<C = MonotonicClock> {
    state: ArcSwap<Tick>,
    /// Time budget per admitted operation: `period / rate`.
    interval: Duration,
    slack: Duration,
    clock: C,
}

impl LeakyBucket {
    /// Creates a limiter admitting `rate` operations per `period`, driven by
    /// the default monotonic clock.
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use pace_limit::LeakyBucket;
    ///
    /// // One admission every 20ms.
    /// let pacer = LeakyBucket::new(50, Duration::from_secs(1)).unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `rate` or `period` is zero; either would
    /// leave the per-operation interval undefined.
    pub fn new(rate: u32, period: Duration) -> Result<Self, ConfigError> {
        Self::with_clock(rate, period, MonotonicClock::new())
    }
}

impl<C: Clock> LeakyBucket<C> {
    /// Creates a limiter driven by the supplied clock.
    ///
    /// Inject a [`ManualClock`](crate::ManualClock) to drive the limiter
    /// deterministically in tests.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `rate` or `period` is zero.
    pub fn with_clock(rate: u32, period: Duration, clock: C) -> Result<Self, ConfigError> {
        if rate == 0 {
            return Err(ConfigError::ZeroRate);
        }
        if period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }

        Ok(Self {
            state: ArcSwap::from_pointee(Tick {
                last: None,
                sleep_for: Duration::ZERO,
            }),
            interval: period / rate,
            slack: DEFAULT_SLACK,
            clock,
        })
    }

    /// Overrides the minimum spacing enforced once computed debt trends
    /// toward zero. Larger values trade strict pacing for a little burst
    /// tolerance after idle stretches.
    pub fn with_slack(mut self, slack: Duration) -> Self {
        self.slack = slack;
        self
    }

    /// The derived time budget per admitted operation.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until it is the caller's turn and returns the timestamp this
    /// call was scheduled for, relative to the clock origin.
    ///
    /// The first call on a fresh limiter is admitted immediately. Every later
    /// call is scheduled one interval after the previous winner, minus the
    /// real time that has already passed since that winner's slot.
    pub fn wait(&self) -> Duration {
        let (scheduled, sleep_for) = loop {
            let now = self.clock.now();
            let old = self.state.load();

            let (next, sleep_for, scheduled) = match old.last {
                // Nothing admitted yet: claim `now` with no delay.
                None => (
                    Tick {
                        last: Some(now),
                        sleep_for: Duration::ZERO,
                    },
                    Duration::ZERO,
                    now,
                ),
                Some(last) => {
                    // Debt carried so far, plus this slot's budget, minus the
                    // real time already elapsed since the last scheduled
                    // tick. `last` sits in the future when the previous
                    // winner pushed its slot past `now`; the shortfall is
                    // more debt.
                    let owed = old.sleep_for + self.interval;
                    let computed = if now >= last {
                        owed.checked_sub(now - last)
                    } else {
                        Some(owed + (last - now))
                    };
                    let sleep_for = match computed {
                        Some(debt) if debt > self.slack => debt,
                        _ => self.slack,
                    };

                    if sleep_for.is_zero() {
                        // On or behind schedule: admit at `now`.
                        (
                            Tick {
                                last: Some(now),
                                sleep_for,
                            },
                            Duration::ZERO,
                            now,
                        )
                    } else {
                        // Spend the debt as this call's sleep and push the
                        // slot past `now` by the same amount.
                        let scheduled = now + sleep_for;
                        (
                            Tick {
                                last: Some(scheduled),
                                sleep_for: Duration::ZERO,
                            },
                            sleep_for,
                            scheduled,
                        )
                    }
                }
            };

            let prev = self.state.compare_and_swap(&old, Arc::new(next));
            if Arc::ptr_eq(&*prev, &*old) {
                break (scheduled, sleep_for);
            }
            // Lost the race: retry against fresh time and a fresh snapshot.
        };

        self.clock.sleep(sleep_for);
        scheduled
    }

    #[cfg(test)]
    pub(crate) fn last_tick(&self) -> Option<Duration> {
        self.state.load().last
    }
}
