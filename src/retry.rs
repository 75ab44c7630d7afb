// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retrying with backoff.
//!
//! Polling operations signal "not ready yet" with a retry signal (by default
//! [`Error::TryAgain`]).  [`TryTimeout`] keeps calling the action until it
//! succeeds, fails with something that isn't a retry signal, or runs out of
//! time, so every poll in the system shares one backoff and timeout policy.
//!
//! ```rust
//! use automation_entities::Error;
//! use automation_entities::retry::TryTimeout;
//! use std::time::Duration;
//!
//! let mut attempts = 0;
//! let value = TryTimeout::new()
//!     .timeout(Duration::from_secs(5))
//!     .step(Duration::from_millis(1))
//!     .run(|| {
//!         attempts += 1;
//!         if attempts < 3 { Err(Error::TryAgain) } else { Ok(attempts) }
//!     })
//!     .unwrap();
//! assert_eq!(value, 3);
//! ```

use crate::error::{Error, RetryError};
use crate::sys::{Duration, SystemTime};
use std::fmt::Debug;
use std::rc::Rc;

/// Default time budget for [`TryTimeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default wait between the first and second attempt.
pub const DEFAULT_STEP: Duration = Duration::from_secs(1);

/// Default factor applied to the wait after each retry.
pub const DEFAULT_STEP_EXP: f64 = 2.0;

/// Source of wall-clock time and blocking sleep.
///
/// Readings are wall-clock time.  A reading earlier than the start of a
/// [`TryTimeout`] run ends that run with a timeout.
pub trait Clock {
    fn now(&self) -> SystemTime;

    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) {
        crate::sys::sleep(duration);
    }
}

/// Errors that carry the default retry signal.
pub trait Retryable {
    fn is_retry_signal(&self) -> bool;
}

impl Retryable for Error {
    fn is_retry_signal(&self) -> bool {
        matches!(self, Error::TryAgain)
    }
}

/// Retry policy builder.
///
/// The first attempt always happens; the deadline is only checked after an
/// attempt fails with a retry signal.  After each such failure the engine
/// sleeps `min(step, time left)`, multiplies `step` by `step_exp`, runs the
/// retry action if one is set, and tries again.  Once elapsed time reaches
/// the timeout, or can't be measured because the clock went backwards, the
/// run ends with [`RetryError::TimedOut`].
pub struct TryTimeout<'a> {
    timeout: Duration,
    step: Duration,
    step_exp: f64,
    clock: Rc<dyn Clock>,
    retry_action: Option<Box<dyn FnMut() + 'a>>,
}

impl Debug for TryTimeout<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryTimeout")
            .field("timeout", &self.timeout)
            .field("step", &self.step)
            .field("step_exp", &self.step_exp)
            .field("retry_action", &self.retry_action.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for TryTimeout<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TryTimeout<'a> {
    pub fn new() -> Self {
        TryTimeout {
            timeout: DEFAULT_TIMEOUT,
            step: DEFAULT_STEP,
            step_exp: DEFAULT_STEP_EXP,
            clock: Rc::new(SystemClock),
            retry_action: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Backoff factor; `1.0` retries at a fixed interval.
    pub fn step_exp(mut self, step_exp: f64) -> Self {
        self.step_exp = step_exp;
        self
    }

    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Called before every retry, after the sleep.
    pub fn retry_action(mut self, action: impl FnMut() + 'a) -> Self {
        self.retry_action = Some(Box::new(action));
        self
    }

    /// Runs `action`, retrying while it fails with its type's retry signal.
    pub fn run<T, E: Retryable>(
        self,
        action: impl FnMut() -> Result<T, E>,
    ) -> Result<T, RetryError<E>> {
        self.run_ignoring(action, E::is_retry_signal)
    }

    /// Runs `action`, retrying while `ignore` accepts the error it fails with.
    ///
    /// This replaces the default retry signal entirely; include it in the
    /// predicate if it should still be honored.
    pub fn run_ignoring<T, E>(
        mut self,
        mut action: impl FnMut() -> Result<T, E>,
        ignore: impl Fn(&E) -> bool,
    ) -> Result<T, RetryError<E>> {
        let start = self.clock.now();
        let mut step = self.step;
        loop {
            match action() {
                Ok(value) => return Ok(value),
                Err(e) if !ignore(&e) => return Err(RetryError::Failed(e)),
                Err(_) => {}
            }

            let elapsed = match self.clock.now().duration_since(start) {
                Ok(elapsed) => elapsed,
                Err(_) => return Err(RetryError::TimedOut),
            };
            if elapsed >= self.timeout {
                return Err(RetryError::TimedOut);
            }

            self.clock.sleep(step.min(self.timeout - elapsed));
            step = next_step(step, self.step_exp);
            if let Some(retry_action) = self.retry_action.as_mut() {
                retry_action();
            }
        }
    }
}

/// `step * step_exp`, keeping the old step if the product isn't a valid
/// duration.
fn next_step(step: Duration, step_exp: f64) -> Duration {
    Duration::try_from_secs_f64(step.as_secs_f64() * step_exp).unwrap_or(step)
}

/// Runs `action` with the default policy on the system clock.
pub fn try_timeout<T, E: Retryable>(
    action: impl FnMut() -> Result<T, E>,
) -> Result<T, RetryError<E>> {
    TryTimeout::new().run(action)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays scripted readings (seconds since the epoch) and records
    /// sleeps instead of blocking.  The last reading repeats once the script
    /// runs out.
    #[derive(Debug, Default)]
    pub(crate) struct FakeClock {
        readings: RefCell<VecDeque<f64>>,
        last: RefCell<f64>,
        pub(crate) sleeps: RefCell<Vec<Duration>>,
    }

    impl FakeClock {
        pub(crate) fn new(readings: &[f64]) -> Rc<FakeClock> {
            Rc::new(FakeClock {
                readings: RefCell::new(readings.iter().copied().collect()),
                last: RefCell::new(0.0),
                sleeps: RefCell::new(Vec::new()),
            })
        }

        pub(crate) fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> SystemTime {
            let reading = match self.readings.borrow_mut().pop_front() {
                Some(reading) => {
                    *self.last.borrow_mut() = reading;
                    reading
                }
                None => *self.last.borrow(),
            };
            SystemTime::UNIX_EPOCH + Duration::from_secs_f64(reading)
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    /// Fails with the retry signal `failures` times, then returns 5.
    fn flaky(failures: usize) -> impl FnMut() -> Result<u32, Error> {
        let mut calls = 0;
        move || {
            calls += 1;
            if calls <= failures {
                Err(Error::TryAgain)
            } else {
                Ok(5)
            }
        }
    }

    #[test]
    fn returns_value() {
        let clock = FakeClock::new(&[0.0]);
        let ret = TryTimeout::new().clock(clock.clone()).run(flaky(0));
        assert_eq!(ret.unwrap(), 5);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn unknown_error_is_not_retried() {
        let clock = FakeClock::new(&[0.0]);
        let mut calls = 0;
        let ret: Result<(), _> = TryTimeout::new().clock(clock.clone()).run(|| {
            calls += 1;
            Err(Error::Usage("unknown exception"))
        });
        assert!(matches!(
            ret,
            Err(RetryError::Failed(Error::Usage("unknown exception")))
        ));
        assert_eq!(calls, 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn timeout() {
        let clock = FakeClock::new(&[0.0, 6.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(5.0))
            .run(flaky(usize::MAX));
        assert!(ret.unwrap_err().is_timed_out());
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn timeout_at_exact_deadline() {
        let clock = FakeClock::new(&[0.0, 5.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(5.0))
            .run(flaky(usize::MAX));
        assert!(ret.unwrap_err().is_timed_out());
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn timeout_before_start() {
        let clock = FakeClock::new(&[5.0, 1.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(5.0))
            .run(flaky(usize::MAX));
        assert!(ret.unwrap_err().is_timed_out());
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn always_attempts_once() {
        let clock = FakeClock::new(&[0.0, 100.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(Duration::ZERO)
            .run(flaky(0));
        assert_eq!(ret.unwrap(), 5);
    }

    #[test]
    fn retry() {
        let clock = FakeClock::new(&[0.0, 3.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(5.0))
            .run(flaky(1));
        assert_eq!(ret.unwrap(), 5);
        assert_eq!(clock.sleeps(), vec![secs(1.0)]);
    }

    #[test]
    fn retry_with_action() {
        let clock = FakeClock::new(&[0.0, 3.0]);
        let mut retries = 0;
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(5.0))
            .retry_action(|| retries += 1)
            .run(flaky(1));
        assert_eq!(ret.unwrap(), 5);
        assert_eq!(retries, 1);
    }

    #[test]
    fn retry_step() {
        let clock = FakeClock::new(&[0.0, 3.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(10.0))
            .step(secs(3.0))
            .run(flaky(1));
        assert_eq!(ret.unwrap(), 5);
        assert_eq!(clock.sleeps(), vec![secs(3.0)]);
    }

    #[test]
    fn retry_remainder() {
        let clock = FakeClock::new(&[0.0, 3.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(5.0))
            .step(secs(5.0))
            .run(flaky(1));
        assert_eq!(ret.unwrap(), 5);
        assert_eq!(clock.sleeps(), vec![secs(2.0)]);
    }

    #[test]
    fn exponential_backoff() {
        let clock = FakeClock::new(&[0.0, 1.0, 3.0, 7.0]);
        let ret = TryTimeout::new().clock(clock.clone()).run(flaky(3));
        assert_eq!(ret.unwrap(), 5);
        assert_eq!(clock.sleeps(), vec![secs(1.0), secs(2.0), secs(4.0)]);
    }

    #[test]
    fn backoff_sequence_within_budget() {
        let clock = FakeClock::new(&[0.0, 0.0, 1.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .timeout(secs(5.0))
            .step(secs(1.0))
            .step_exp(2.0)
            .run(flaky(2));
        assert_eq!(ret.unwrap(), 5);
        assert_eq!(clock.sleeps(), vec![secs(1.0), secs(2.0)]);
    }

    #[test]
    fn linear_backoff() {
        let clock = FakeClock::new(&[0.0, 1.0, 2.0, 3.0]);
        let ret = TryTimeout::new()
            .clock(clock.clone())
            .step_exp(1.0)
            .run(flaky(3));
        assert_eq!(ret.unwrap(), 5);
        assert_eq!(clock.sleeps(), vec![secs(1.0), secs(1.0), secs(1.0)]);
    }

    #[test]
    fn custom_ignore_set() {
        let clock = FakeClock::new(&[0.0, 1.0]);
        let mut calls = 0;
        let ret = TryTimeout::new().clock(clock.clone()).run_ignoring(
            || {
                calls += 1;
                if calls == 1 { Err("no such element") } else { Ok("found") }
            },
            |e| *e == "no such element",
        );
        assert_eq!(ret, Ok("found"));

        // the default signal is not implied once a predicate is given
        let ret: Result<(), _> = TryTimeout::new()
            .clock(FakeClock::new(&[0.0]))
            .run_ignoring(|| Err(Error::TryAgain), |e| matches!(e, Error::Driver(_)));
        assert!(matches!(ret, Err(RetryError::Failed(Error::TryAgain))));
    }

    #[test]
    fn next_step_keeps_step_on_invalid_product() {
        assert_eq!(next_step(secs(2.0), -1.0), secs(2.0));
        assert_eq!(next_step(secs(2.0), f64::NAN), secs(2.0));
        assert_eq!(next_step(secs(2.0), 1.5), secs(3.0));
    }

    #[test]
    fn free_function_uses_real_clock() {
        let ret = try_timeout(flaky(0));
        assert_eq!(ret.unwrap(), 5);
    }
}
