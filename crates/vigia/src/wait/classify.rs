//! Turning an expired deadline into a [`TimeoutFailure`].

use crate::result::{TimeoutFailure, VigiaResult};
use std::time::Duration;

/// Bookkeeping a poller hands over when its deadline expires
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Time spent polling
    pub elapsed: Duration,
    /// Predicate evaluations performed
    pub attempts: u32,
    /// Message of the last transient error swallowed
    pub last_transient: Option<String>,
}

/// Build the failure for an expired wait.
///
/// `snapshot` is called once, now, to record what the environment looked
/// like at the moment of failure. If it errors, the failure says so in its
/// context instead of being replaced by that error.
pub fn classify(
    description: &str,
    timeout: Duration,
    stats: PollStats,
    snapshot: Option<&dyn Fn() -> VigiaResult<String>>,
) -> TimeoutFailure {
    let context = snapshot.map(|take| match take() {
        Ok(value) => value,
        Err(e) => format!("snapshot unavailable: {e}"),
    });

    TimeoutFailure {
        description: description.to_string(),
        timeout,
        elapsed: stats.elapsed,
        attempts: stats.attempts,
        last_transient: stats.last_transient,
        context,
    }
}
