//! Named waits over a browser session.

use super::{Check, Poller, TimeoutTier, WaitConfig};
use crate::config::Timeouts;
use crate::locator::Locator;
use crate::result::{VigiaError, VigiaResult};
use crate::session::{BrowserSession, ElementState, PageState};
use std::time::Duration;

/// A composable wait step for [`Waiter::all`]
pub type WaitStep<'f> = &'f dyn Fn(&Waiter<'_>) -> VigiaResult<()>;

/// Wait facade bound to one session.
///
/// Each operation builds a [`Poller`] from the waiter's [`WaitConfig`], so a
/// failure always names the condition and the timeout that applied.
/// Shorter or longer waits come from [`Waiter::within`] or a
/// [`TimeoutTier`]; the waiter itself is never mutated.
#[derive(Clone, Copy)]
pub struct Waiter<'s> {
    session: &'s dyn BrowserSession,
    config: WaitConfig,
    timeouts: Timeouts,
}

impl std::fmt::Debug for Waiter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("session", &self.session.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'s> Waiter<'s> {
    /// Waiter with an explicit config and default tiers
    #[must_use]
    pub fn new(session: &'s dyn BrowserSession, config: WaitConfig) -> Self {
        Self {
            session,
            config,
            timeouts: Timeouts::default(),
        }
    }

    /// Waiter on the default tier of `timeouts`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the tier values are invalid.
    pub fn from_timeouts(session: &'s dyn BrowserSession, timeouts: &Timeouts) -> VigiaResult<Self> {
        Ok(Self {
            session,
            config: WaitConfig::from_timeouts(timeouts, TimeoutTier::Default)?,
            timeouts: *timeouts,
        })
    }

    /// Session this waiter polls
    #[must_use]
    pub fn session(&self) -> &'s dyn BrowserSession {
        self.session
    }

    /// Active config
    #[must_use]
    pub const fn config(&self) -> WaitConfig {
        self.config
    }

    /// Same waiter with a different timeout
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero timeout.
    pub fn within(&self, timeout: Duration) -> VigiaResult<Self> {
        let config = WaitConfig::new(timeout, self.config.poll_interval().min(timeout))?;
        Ok(Self { config, ..*self })
    }

    /// Same waiter on a named tier
    pub fn tier(&self, tier: TimeoutTier) -> VigiaResult<Self> {
        let config = WaitConfig::from_timeouts(&self.timeouts, tier)?;
        Ok(Self { config, ..*self })
    }

    /// Shorthand for the quick tier
    pub fn quick(&self) -> VigiaResult<Self> {
        self.tier(TimeoutTier::Quick)
    }

    /// Shorthand for the extended tier
    pub fn extended(&self) -> VigiaResult<Self> {
        self.tier(TimeoutTier::Extended)
    }

    fn poller(&self, description: String) -> Poller<'s> {
        Poller::new(description, self.config.timeout())
            .with_poll_interval(self.config.poll_interval())
    }

    fn element_snapshot(&self, locator: &Locator) -> impl Fn() -> VigiaResult<String> + 's {
        let session = self.session;
        let locator = locator.clone();
        move || {
            session.element_state(&locator).map(|s| {
                format!(
                    "last state: visible={}, enabled={}, text={:?}",
                    s.visible, s.enabled, s.text
                )
            })
        }
    }

    /// Wait until the element is present and visible
    ///
    /// # Errors
    ///
    /// Timeout if it never shows up, or any non-transient session error.
    pub fn until_visible(&self, locator: &Locator) -> VigiaResult<ElementState> {
        let session = self.session;
        self.poller(format!("{} to be visible", locator.describe()))
            .with_snapshot(self.element_snapshot(locator))
            .poll(|| {
                let state = session.element_state(locator)?;
                Ok(if state.visible {
                    Check::Ready(state)
                } else {
                    Check::Pending
                })
            })
    }

    /// Wait until the element is visible and enabled
    pub fn until_clickable(&self, locator: &Locator) -> VigiaResult<ElementState> {
        let session = self.session;
        self.poller(format!("{} to be clickable", locator.describe()))
            .with_snapshot(self.element_snapshot(locator))
            .poll(|| {
                let state = session.element_state(locator)?;
                Ok(if state.is_clickable() {
                    Check::Ready(state)
                } else {
                    Check::Pending
                })
            })
    }

    /// Wait until the element is hidden or gone; absence counts as invisible
    pub fn until_invisible(&self, locator: &Locator) -> VigiaResult<()> {
        let session = self.session;
        self.poller(format!("{} to disappear", locator.describe()))
            .with_snapshot(self.element_snapshot(locator))
            .poll(|| match session.element_state(locator) {
                Ok(state) if state.visible => Ok(Check::Pending),
                Ok(_) | Err(VigiaError::ElementNotFound { .. } | VigiaError::StaleElement { .. }) => {
                    Ok(Check::Ready(()))
                }
                Err(e) => Err(e),
            })
    }

    /// Wait for an arbitrary predicate over the session
    pub fn until_condition<F>(&self, description: &str, mut predicate: F) -> VigiaResult<()>
    where
        F: FnMut(&dyn BrowserSession) -> VigiaResult<bool>,
    {
        let session = self.session;
        self.poller(description.to_string())
            .until(|| predicate(session))
    }

    /// Wait until `document.readyState` is `complete`
    pub fn until_page_ready(&self) -> VigiaResult<PageState> {
        let session = self.session;
        self.poller("page to be ready".to_string())
            .with_snapshot(move || {
                session
                    .current_state()
                    .map(|p| format!("readyState: {}, url: {}", p.ready_state, p.url))
            })
            .poll(|| {
                let page = session.current_state()?;
                Ok(if page.is_complete() {
                    Check::Ready(page)
                } else {
                    Check::Pending
                })
            })
    }

    /// Wait until the document title contains `fragment`
    pub fn until_title_contains(&self, fragment: &str) -> VigiaResult<String> {
        let session = self.session;
        self.poller(format!("title to contain {fragment:?}"))
            .with_snapshot(move || {
                session
                    .current_state()
                    .map(|p| format!("current title: {:?}", p.title))
            })
            .until_some(|| {
                let page = session.current_state()?;
                Ok(page.title.contains(fragment).then_some(page.title))
            })
    }

    /// Wait until the current URL contains `fragment`
    pub fn until_url_contains(&self, fragment: &str) -> VigiaResult<String> {
        let session = self.session;
        self.poller(format!("url to contain {fragment:?}"))
            .with_snapshot(move || {
                session
                    .current_state()
                    .map(|p| format!("current url: {}", p.url))
            })
            .until_some(|| {
                let page = session.current_state()?;
                Ok(page.url.contains(fragment).then_some(page.url))
            })
    }

    /// Wait until the element's text contains `fragment`; returns the text
    pub fn until_text_contains(&self, locator: &Locator, fragment: &str) -> VigiaResult<String> {
        let session = self.session;
        self.poller(format!("{} to contain {fragment:?}", locator.describe()))
            .with_snapshot(self.element_snapshot(locator))
            .until_some(|| {
                let text = session.text(locator)?;
                Ok(text.contains(fragment).then_some(text))
            })
    }

    /// Wait until at least `minimum` elements match; returns the count
    pub fn until_count_at_least(&self, locator: &Locator, minimum: usize) -> VigiaResult<usize> {
        let session = self.session;
        let snapshot_locator = locator.clone();
        self.poller(format!("at least {minimum} of {}", locator.describe()))
            .with_snapshot(move || {
                session
                    .count(&snapshot_locator)
                    .map(|n| format!("found {n}"))
            })
            .until_some(|| {
                let n = session.count(locator)?;
                Ok((n >= minimum).then_some(n))
            })
    }

    /// Wait for a JS alert and return its message
    pub fn until_alert(&self) -> VigiaResult<String> {
        let session = self.session;
        self.poller("alert to appear".to_string())
            .until_some(|| session.take_alert())
    }

    /// Run several waits in order; the first failure is returned as is
    ///
    /// Each step gets this waiter, so a timeout names the sub-wait that
    /// expired rather than the group.
    pub fn all(&self, steps: &[WaitStep<'_>]) -> VigiaResult<()> {
        for step in steps {
            step(self)?;
        }
        Ok(())
    }
}
