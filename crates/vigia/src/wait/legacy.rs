//! Boolean wait helpers kept for older step code.
//!
//! Each helper delegates to the matching [`Waiter`] operation and folds a
//! timeout into `Ok(false)`. Every other error still propagates, so a broken
//! selector script or a closed browser is never reported as "not visible".
//! New code should call [`Waiter`] directly and keep the timeout details.

#![allow(deprecated)]

use super::{WaitConfig, Waiter};
use crate::locator::Locator;
use crate::result::{VigiaError, VigiaResult};
use crate::session::BrowserSession;
use std::time::Duration;

fn adapt<T>(result: VigiaResult<T>) -> VigiaResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(VigiaError::Timeout(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

fn waiter(session: &dyn BrowserSession, timeout_secs: u64) -> VigiaResult<Waiter<'_>> {
    Ok(Waiter::new(
        session,
        WaitConfig::with_timeout(Duration::from_secs(timeout_secs))?,
    ))
}

/// `true` once the element is visible, `false` on timeout
#[deprecated(since = "0.3.0", note = "use `Waiter::until_visible`")]
pub fn is_visible(
    session: &dyn BrowserSession,
    locator: &Locator,
    timeout_secs: u64,
) -> VigiaResult<bool> {
    adapt(waiter(session, timeout_secs)?.until_visible(locator))
}

/// `true` once the element is clickable, `false` on timeout
#[deprecated(since = "0.3.0", note = "use `Waiter::until_clickable`")]
pub fn is_clickable(
    session: &dyn BrowserSession,
    locator: &Locator,
    timeout_secs: u64,
) -> VigiaResult<bool> {
    adapt(waiter(session, timeout_secs)?.until_clickable(locator))
}

/// `true` once the element is hidden or gone, `false` on timeout
#[deprecated(since = "0.3.0", note = "use `Waiter::until_invisible`")]
pub fn is_invisible(
    session: &dyn BrowserSession,
    locator: &Locator,
    timeout_secs: u64,
) -> VigiaResult<bool> {
    adapt(waiter(session, timeout_secs)?.until_invisible(locator))
}

/// `true` once the title contains `fragment`, `false` on timeout
#[deprecated(since = "0.3.0", note = "use `Waiter::until_title_contains`")]
pub fn is_title_containing(
    session: &dyn BrowserSession,
    fragment: &str,
    timeout_secs: u64,
) -> VigiaResult<bool> {
    adapt(waiter(session, timeout_secs)?.until_title_contains(fragment))
}

/// `true` once the document is complete, `false` on timeout
#[deprecated(since = "0.3.0", note = "use `Waiter::until_page_ready`")]
pub fn is_page_ready(session: &dyn BrowserSession, timeout_secs: u64) -> VigiaResult<bool> {
    adapt(waiter(session, timeout_secs)?.until_page_ready())
}

/// `true` once `predicate` holds, `false` on timeout
#[deprecated(since = "0.3.0", note = "use `Waiter::until_condition`")]
pub fn condition_holds<F>(
    session: &dyn BrowserSession,
    description: &str,
    timeout_secs: u64,
    predicate: F,
) -> VigiaResult<bool>
where
    F: FnMut(&dyn BrowserSession) -> VigiaResult<bool>,
{
    adapt(waiter(session, timeout_secs)?.until_condition(description, predicate))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::id;
    use crate::session::{ReadyState, ScriptedElement, ScriptedSession};

    #[test]
    fn test_adapt_maps_outcomes() {
        assert!(adapt(Ok(())).unwrap());
        let timeout = crate::wait::Poller::new("never", Duration::from_millis(10))
            .until(|| Ok(false));
        assert!(!adapt(timeout).unwrap());
        let hard: VigiaResult<()> = Err(VigiaError::script("boom"));
        assert!(adapt(hard).is_err());
    }

    #[test]
    fn test_agrees_with_waiter_on_success() {
        let session = ScriptedSession::new();
        session.set_element("#cartur", ScriptedElement::visible("Cart"));
        let core = Waiter::new(&session, WaitConfig::with_timeout(Duration::from_secs(1)).unwrap())
            .until_visible(&id("cartur"));
        assert!(core.is_ok());
        assert!(is_visible(&session, &id("cartur"), 1).unwrap());
        assert!(is_clickable(&session, &id("cartur"), 1).unwrap());
    }

    #[test]
    fn test_agrees_with_waiter_on_timeout() {
        let session = ScriptedSession::new();
        session.set_ready_state(ReadyState::Loading);
        let core = Waiter::new(&session, WaitConfig::with_timeout(Duration::from_secs(1)).unwrap())
            .until_page_ready();
        assert!(core.unwrap_err().is_timeout());
        assert!(!is_page_ready(&session, 1).unwrap());
    }

    #[test]
    fn test_non_timeout_errors_propagate() {
        let session = ScriptedSession::new();
        session.fail_next(1, || VigiaError::browser("target closed"));
        let err = is_title_containing(&session, "STORE", 1).unwrap_err();
        assert!(matches!(err, VigiaError::Browser { .. }));
    }

    #[test]
    fn test_invisible_and_condition() {
        let session = ScriptedSession::new();
        session.set_title("STORE");
        assert!(is_invisible(&session, &id("orderModal"), 1).unwrap());
        assert!(condition_holds(&session, "title set", 1, |s| Ok(
            s.current_state()?.title == "STORE"
        ))
        .unwrap());
    }

    #[test]
    fn test_zero_timeout_is_configuration_error() {
        let session = ScriptedSession::new();
        let err = is_page_ready(&session, 0).unwrap_err();
        assert!(matches!(err, VigiaError::Configuration { .. }));
    }
}
