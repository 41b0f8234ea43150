//! Browser sessions.
//!
//! [`BrowserSession`] is the seam between waits/page objects and whatever
//! actually drives a browser. Queries take `&self` so a [`Waiter`] and a page
//! object can share one session; only [`BrowserSession::quit`] needs `&mut`.
//!
//! Element queries report "not there yet" through the transient error
//! variants ([`VigiaError::ElementNotFound`] and friends) so pollers can tell
//! them apart from real failures.
//!
//! [`Waiter`]: crate::wait::Waiter
//! [`VigiaError::ElementNotFound`]: crate::VigiaError::ElementNotFound

#[cfg(feature = "browser")]
mod cdp;
mod scripted;

#[cfg(feature = "browser")]
pub use cdp::ChromiumSession;
pub use scripted::{ScriptedElement, ScriptedSession, ScriptedState};

use crate::locator::Locator;
use crate::result::VigiaResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `document.readyState` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    /// Document is still loading
    #[default]
    Loading,
    /// Document parsed, sub-resources still loading
    Interactive,
    /// Document and sub-resources loaded
    Complete,
}

impl ReadyState {
    /// Parse the DOM string form; unknown values count as `Loading`
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "complete" => Self::Complete,
            "interactive" => Self::Interactive,
            _ => Self::Loading,
        }
    }

    /// DOM string form
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the page-level state polled by page-ready and title waits
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageState {
    /// Document title
    pub title: String,
    /// Current URL
    pub url: String,
    /// Document ready state
    pub ready_state: ReadyState,
}

impl PageState {
    /// Whether the document reports `complete`
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.ready_state == ReadyState::Complete
    }
}

/// Snapshot of a single element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementState {
    /// Rendered and not hidden
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Trimmed text content
    pub text: String,
}

impl ElementState {
    /// Visible and enabled
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// A live, stateful handle to a browser under test.
pub trait BrowserSession: Send {
    /// Short name for logs ("chromium", "scripted")
    fn name(&self) -> &str;

    /// Load a URL and return once the navigation was committed
    fn navigate(&self, url: &str) -> VigiaResult<()>;

    /// Current title, URL and ready state
    fn current_state(&self) -> VigiaResult<PageState>;

    /// State of the first element matching `locator`.
    ///
    /// Returns [`VigiaError::ElementNotFound`](crate::VigiaError::ElementNotFound)
    /// when nothing matches.
    fn element_state(&self, locator: &Locator) -> VigiaResult<ElementState>;

    /// Number of elements matching `locator`
    fn count(&self, locator: &Locator) -> VigiaResult<usize>;

    /// Text of every element matching `locator`, in document order
    fn texts(&self, locator: &Locator) -> VigiaResult<Vec<String>>;

    /// Click the first matching element
    fn click(&self, locator: &Locator) -> VigiaResult<()>;

    /// Replace the value of the first matching input
    fn fill(&self, locator: &Locator, text: &str) -> VigiaResult<()>;

    /// Pop the oldest unread `alert`/`confirm` message, if any
    fn take_alert(&self) -> VigiaResult<Option<String>>;

    /// PNG screenshot of the viewport
    fn screenshot(&self) -> VigiaResult<Vec<u8>>;

    /// Serialized DOM
    fn page_source(&self) -> VigiaResult<String>;

    /// Close the browser; further calls fail
    fn quit(&mut self) -> VigiaResult<()>;

    /// Text of the first matching element
    fn text(&self, locator: &Locator) -> VigiaResult<String> {
        self.element_state(locator).map(|state| state.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_parse() {
        assert_eq!(ReadyState::parse("complete"), ReadyState::Complete);
        assert_eq!(ReadyState::parse("interactive"), ReadyState::Interactive);
        assert_eq!(ReadyState::parse("loading"), ReadyState::Loading);
        assert_eq!(ReadyState::parse("uninitialized"), ReadyState::Loading);
    }

    #[test]
    fn test_ready_state_display_round_trips() {
        for state in [
            ReadyState::Loading,
            ReadyState::Interactive,
            ReadyState::Complete,
        ] {
            assert_eq!(ReadyState::parse(&state.to_string()), state);
        }
    }

    #[test]
    fn test_page_state_complete() {
        let mut state = PageState::default();
        assert!(!state.is_complete());
        state.ready_state = ReadyState::Complete;
        assert!(state.is_complete());
    }

    #[test]
    fn test_element_clickable() {
        let mut el = ElementState {
            visible: true,
            enabled: false,
            text: String::new(),
        };
        assert!(!el.is_clickable());
        el.enabled = true;
        assert!(el.is_clickable());
    }

    #[test]
    fn test_ready_state_serde_lowercase() {
        let json = serde_json::to_string(&ReadyState::Interactive).unwrap();
        assert_eq!(json, "\"interactive\"");
    }
}
