//! The polling loop every wait runs on.

use super::classify::{classify, PollStats};
use super::{validate, Check, DEFAULT_POLL_INTERVAL_MS};
use crate::result::{VigiaError, VigiaResult};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

type Snapshot<'a> = Box<dyn Fn() -> VigiaResult<String> + 'a>;

/// One configured wait: description, deadline, interval, optional snapshot.
///
/// ```
/// use std::time::Duration;
/// use vigia::wait::{Check, Poller};
///
/// let mut n = 0;
/// let value = Poller::new("counter to reach 3", Duration::from_secs(1))
///     .with_poll_interval(Duration::from_millis(5))
///     .poll(|| {
///         n += 1;
///         Ok(if n >= 3 { Check::Ready(n) } else { Check::Pending })
///     })
///     .unwrap();
/// assert_eq!(value, 3);
/// ```
pub struct Poller<'a> {
    description: String,
    timeout: Duration,
    poll_interval: Duration,
    snapshot: Option<Snapshot<'a>>,
}

impl std::fmt::Debug for Poller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("description", &self.description)
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("snapshot", &self.snapshot.is_some())
            .finish()
    }
}

impl<'a> Poller<'a> {
    /// Create a poller with the default interval, clamped to `timeout`
    #[must_use]
    pub fn new(description: impl Into<String>, timeout: Duration) -> Self {
        let interval = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
        Self {
            description: description.into(),
            timeout,
            poll_interval: if timeout.is_zero() {
                interval
            } else {
                interval.min(timeout)
            },
            snapshot: None,
        }
    }

    /// Set the delay between evaluations
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Attach a snapshot taken once if the deadline expires
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: impl Fn() -> VigiaResult<String> + 'a) -> Self {
        self.snapshot = Some(Box::new(snapshot));
        self
    }

    /// What is being awaited
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the probe until it is ready, fails hard, or the deadline passes.
    ///
    /// The probe is evaluated immediately, then once per interval. Transient
    /// errors are remembered and retried. The last sleep is shortened so the
    /// loop never overshoots the deadline by more than one evaluation.
    ///
    /// # Errors
    ///
    /// - [`VigiaError::Configuration`] for a zero timeout or interval, or an
    ///   interval longer than the timeout; the probe is never called
    /// - any non-transient error the probe returns, unchanged
    /// - [`VigiaError::Timeout`] once the deadline has passed
    pub fn poll<T, F>(self, mut probe: F) -> VigiaResult<T>
    where
        F: FnMut() -> VigiaResult<Check<T>>,
    {
        validate(self.timeout, self.poll_interval)?;

        let start = Instant::now();
        let deadline = start.checked_add(self.timeout).ok_or_else(|| {
            VigiaError::config(format!(
                "wait timeout {}s is too large",
                self.timeout.as_secs()
            ))
        })?;
        let mut attempts: u32 = 0;
        let mut last_transient: Option<String> = None;

        debug!(
            condition = %self.description,
            timeout_ms = self.timeout.as_millis() as u64,
            "waiting"
        );

        loop {
            attempts = attempts.saturating_add(1);
            match probe() {
                Ok(Check::Ready(value)) => {
                    debug!(
                        condition = %self.description,
                        attempts,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "condition met"
                    );
                    return Ok(value);
                }
                Ok(Check::Pending) => {}
                Err(e) if e.is_transient() => {
                    trace!(condition = %self.description, error = %e, "transient error while polling");
                    last_transient = Some(e.to_string());
                }
                Err(e) => {
                    debug!(condition = %self.description, error = %e, "wait aborted");
                    return Err(e);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }

        let stats = PollStats {
            elapsed: start.elapsed(),
            attempts,
            last_transient,
        };
        let failure = classify(
            &self.description,
            self.timeout,
            stats,
            self.snapshot.as_deref(),
        );
        warn!(
            condition = %failure.description,
            timeout_ms = failure.timeout_ms(),
            attempts = failure.attempts,
            "wait timed out"
        );
        Err(VigiaError::from(failure))
    }

    /// Poll a boolean predicate
    pub fn until<F>(self, mut predicate: F) -> VigiaResult<()>
    where
        F: FnMut() -> VigiaResult<bool>,
    {
        self.poll(|| predicate().map(Check::from))
    }

    /// Poll until the probe yields a value
    pub fn until_some<T, F>(self, mut probe: F) -> VigiaResult<T>
    where
        F: FnMut() -> VigiaResult<Option<T>>,
    {
        self.poll(|| probe().map(Check::from))
    }
}
