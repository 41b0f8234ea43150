//! Explicit waits.
//!
//! Every wait in Vigia is a [`Poller`] run: evaluate a probe immediately,
//! re-evaluate at a fixed interval, and stop on the first of
//!
//! - the probe reporting [`Check::Ready`] (normal return),
//! - the probe failing with a non-transient error (returned as is),
//! - the deadline passing (a [`TimeoutFailure`] built by [`classify`]).
//!
//! Transient errors ([`VigiaError::is_transient`]) count as "not yet".
//!
//! [`Waiter`] is the facade page objects and steps use: named operations
//! over a [`BrowserSession`](crate::session::BrowserSession), each one a
//! pre-configured poller. [`legacy`] keeps the old boolean helpers alive as
//! a thin adapter over it.
//!
//! [`TimeoutFailure`]: crate::TimeoutFailure
//! [`VigiaError::is_transient`]: crate::VigiaError::is_transient

mod classify;
pub mod legacy;
mod poller;
mod waiter;

pub use classify::{classify, PollStats};
pub use poller::Poller;
pub use waiter::Waiter;

use crate::config::Timeouts;
use crate::result::{VigiaError, VigiaResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Longest accepted wait timeout (one day)
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Outcome of one successful probe evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check<T> {
    /// Condition holds; carries the probe's value
    Ready(T),
    /// Condition does not hold yet
    Pending,
}

impl<T> Check<T> {
    /// Whether the condition held
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl From<bool> for Check<()> {
    fn from(ready: bool) -> Self {
        if ready {
            Self::Ready(())
        } else {
            Self::Pending
        }
    }
}

impl<T> From<Option<T>> for Check<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Pending, Self::Ready)
    }
}

/// Named timeout tiers from the environment config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutTier {
    /// Short checks (modals, alerts)
    Quick,
    /// Regular element and page waits
    #[default]
    Default,
    /// Slow pages and network-bound waits
    Extended,
}

impl TimeoutTier {
    /// Pick this tier's timeout from `timeouts`
    #[must_use]
    pub const fn timeout(self, timeouts: &Timeouts) -> Duration {
        Duration::from_secs(match self {
            Self::Quick => timeouts.quick_timeout_secs,
            Self::Default => timeouts.default_timeout_secs,
            Self::Extended => timeouts.extended_timeout_secs,
        })
    }
}

/// Immutable timeout/interval pair used by a [`Waiter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitConfig {
    /// Create a validated config.
    ///
    /// # Errors
    ///
    /// [`VigiaError::Configuration`] if the timeout is zero, the interval is
    /// zero, or the interval exceeds the timeout.
    pub fn new(timeout: Duration, poll_interval: Duration) -> VigiaResult<Self> {
        validate(timeout, poll_interval)?;
        Ok(Self {
            timeout,
            poll_interval,
        })
    }

    /// Config with the given timeout and an interval clamped to it
    pub fn with_timeout(timeout: Duration) -> VigiaResult<Self> {
        Self::new(
            timeout,
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS).min(timeout),
        )
    }

    /// Config for a tier of the environment timeouts
    pub fn from_timeouts(timeouts: &Timeouts, tier: TimeoutTier) -> VigiaResult<Self> {
        let timeout = tier.timeout(timeouts);
        Self::new(
            timeout,
            Duration::from_millis(timeouts.poll_interval_ms).min(timeout),
        )
    }

    /// Timeout applied when a wait gets no override
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between evaluations
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

pub(crate) fn validate(timeout: Duration, poll_interval: Duration) -> VigiaResult<()> {
    if timeout.is_zero() {
        return Err(VigiaError::config("wait timeout must be greater than zero"));
    }
    if timeout > Duration::from_secs(MAX_WAIT_TIMEOUT_SECS) {
        return Err(VigiaError::config(format!(
            "wait timeout {}s exceeds the {MAX_WAIT_TIMEOUT_SECS}s limit",
            timeout.as_secs()
        )));
    }
    if poll_interval.is_zero() {
        return Err(VigiaError::config("poll interval must be greater than zero"));
    }
    if poll_interval > timeout {
        return Err(VigiaError::config(format!(
            "poll interval {}ms exceeds timeout {}ms",
            poll_interval.as_millis(),
            timeout.as_millis()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod wait_config_tests {
        use super::*;

        #[test]
        fn test_default() {
            let config = WaitConfig::default();
            assert_eq!(config.timeout(), Duration::from_secs(10));
            assert_eq!(config.poll_interval(), Duration::from_millis(100));
        }

        #[test]
        fn test_zero_timeout_rejected() {
            let err = WaitConfig::new(Duration::ZERO, Duration::from_millis(10)).unwrap_err();
            assert!(matches!(err, VigiaError::Configuration { .. }));
        }

        #[test]
        fn test_zero_interval_rejected() {
            let err = WaitConfig::new(Duration::from_secs(1), Duration::ZERO).unwrap_err();
            assert!(matches!(err, VigiaError::Configuration { .. }));
        }

        #[test]
        fn test_interval_larger_than_timeout_rejected() {
            let err =
                WaitConfig::new(Duration::from_millis(50), Duration::from_millis(100)).unwrap_err();
            assert!(err.to_string().contains("exceeds timeout"));
        }

        #[test]
        fn test_timeout_above_one_day_rejected() {
            let err = WaitConfig::new(Duration::from_secs(u64::MAX), Duration::from_millis(100))
                .unwrap_err();
            assert!(err.to_string().contains("limit"));
            assert!(WaitConfig::new(
                Duration::from_secs(MAX_WAIT_TIMEOUT_SECS),
                Duration::from_millis(100)
            )
            .is_ok());
        }

        #[test]
        fn test_with_timeout_clamps_interval() {
            let config = WaitConfig::with_timeout(Duration::from_millis(40)).unwrap();
            assert_eq!(config.poll_interval(), Duration::from_millis(40));
        }

        #[test]
        fn test_from_timeouts_tiers() {
            let timeouts = Timeouts::default();
            let quick = WaitConfig::from_timeouts(&timeouts, TimeoutTier::Quick).unwrap();
            let extended = WaitConfig::from_timeouts(&timeouts, TimeoutTier::Extended).unwrap();
            assert_eq!(quick.timeout(), Duration::from_secs(5));
            assert_eq!(extended.timeout(), Duration::from_secs(30));
            assert_eq!(quick.poll_interval(), Duration::from_millis(100));
        }
    }

    mod check_tests {
        use super::*;

        #[test]
        fn test_from_bool() {
            assert!(Check::from(true).is_ready());
            assert!(!Check::from(false).is_ready());
        }

        #[test]
        fn test_from_option() {
            assert_eq!(Check::from(Some(3)), Check::Ready(3));
            assert_eq!(Check::<i32>::from(None), Check::Pending);
        }
    }

    mod tier_tests {
        use super::*;

        #[test]
        fn test_tier_default() {
            assert_eq!(TimeoutTier::default(), TimeoutTier::Default);
        }

        #[test]
        fn test_tier_reads_config() {
            let timeouts = Timeouts {
                default_timeout_secs: 7,
                ..Timeouts::default()
            };
            assert_eq!(
                TimeoutTier::Default.timeout(&timeouts),
                Duration::from_secs(7)
            );
        }
    }
}
