//! Result and error types for Vigia.
//!
//! Errors fall into four families. Transient evaluation errors are the
//! closed set a poller may swallow while waiting ([`VigiaError::is_transient`]).
//! Timeouts carry a [`TimeoutFailure`]. Configuration errors are raised before
//! any polling starts. Everything else aborts a wait immediately.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for Vigia operations
pub type VigiaResult<T> = Result<T, VigiaError>;

/// Errors that can occur in Vigia
#[derive(Debug, Error)]
pub enum VigiaError {
    /// No element matched the locator (yet)
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector that was queried
        selector: String,
    },

    /// Element was detached from the document between lookup and use
    #[error("Stale element: {selector}")]
    StaleElement {
        /// Selector that was queried
        selector: String,
    },

    /// Element exists but cannot receive input
    #[error("Element not interactable: {selector}")]
    NotInteractable {
        /// Selector that was queried
        selector: String,
    },

    /// Script ran while the document was being replaced
    #[error("Document not ready (readyState: {ready_state})")]
    DocumentNotReady {
        /// Last known ready state
        ready_state: String,
    },

    /// Wait deadline elapsed without the condition holding
    #[error("{0}")]
    Timeout(Box<TimeoutFailure>),

    /// Invalid wait or environment configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Script evaluation failed in the page
    #[error("Script error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Browser session error
    #[error("Browser error: {message}")]
    Browser {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response status did not match the expectation
    #[error("Unexpected status {status} from {url} (expected {expected})")]
    UnexpectedStatus {
        /// Status received
        status: u16,
        /// Status expected
        expected: u16,
        /// Request URL
        url: String,
    },

    /// Assertion failed inside a step
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Evidence capture failed
    #[error("Evidence capture failed: {message}")]
    Evidence {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl VigiaError {
    /// Whether this error only means "not yet": the poller retries these
    /// until its deadline instead of aborting.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::StaleElement { .. }
                | Self::NotInteractable { .. }
                | Self::DocumentNotReady { .. }
        )
    }

    /// Whether this error is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Borrow the timeout details, if this is a timeout
    #[must_use]
    pub fn as_timeout(&self) -> Option<&TimeoutFailure> {
        match self {
            Self::Timeout(failure) => Some(&**failure),
            _ => None,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a browser error
    #[must_use]
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }
}

impl From<TimeoutFailure> for VigiaError {
    fn from(failure: TimeoutFailure) -> Self {
        Self::Timeout(Box::new(failure))
    }
}

/// Terminal failure of a wait whose deadline elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutFailure {
    /// What was awaited
    pub description: String,
    /// Configured timeout
    pub timeout: Duration,
    /// Time actually spent polling
    pub elapsed: Duration,
    /// Number of predicate evaluations
    pub attempts: u32,
    /// Last transient error swallowed while polling
    pub last_transient: Option<String>,
    /// Environment snapshot taken when the deadline expired
    pub context: Option<String>,
}

impl TimeoutFailure {
    /// Timeout in whole milliseconds
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl fmt::Display for TimeoutFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timed out after {}ms waiting for {} ({} attempts)",
            self.timeout_ms(),
            self.description,
            self.attempts
        )?;
        if let Some(ref context) = self.context {
            write!(f, "; {context}")?;
        }
        if let Some(ref transient) = self.last_transient {
            write!(f, "; last error: {transient}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn failure() -> TimeoutFailure {
        TimeoutFailure {
            description: "title to contain \"STORE\"".to_string(),
            timeout: Duration::from_millis(1500),
            elapsed: Duration::from_millis(1512),
            attempts: 16,
            last_transient: None,
            context: Some("current title: \"Loading\"".to_string()),
        }
    }

    #[test]
    fn test_transient_set_is_closed() {
        assert!(VigiaError::ElementNotFound {
            selector: "#x".into()
        }
        .is_transient());
        assert!(VigiaError::StaleElement {
            selector: "#x".into()
        }
        .is_transient());
        assert!(VigiaError::NotInteractable {
            selector: "#x".into()
        }
        .is_transient());
        assert!(VigiaError::DocumentNotReady {
            ready_state: "loading".into()
        }
        .is_transient());

        assert!(!VigiaError::script("ReferenceError: x is not defined").is_transient());
        assert!(!VigiaError::browser("target closed").is_transient());
        assert!(!VigiaError::config("zero timeout").is_transient());
        assert!(!VigiaError::from(failure()).is_transient());
    }

    #[test]
    fn test_timeout_display_names_condition_and_timeout() {
        let err = VigiaError::from(failure());
        let message = err.to_string();
        assert!(message.contains("1500ms"));
        assert!(message.contains("title to contain \"STORE\""));
        assert!(message.contains("current title: \"Loading\""));
    }

    #[test]
    fn test_timeout_display_includes_last_transient() {
        let mut f = failure();
        f.context = None;
        f.last_transient = Some("Stale element: #tbodyid".into());
        let message = f.to_string();
        assert!(message.contains("last error: Stale element: #tbodyid"));
    }

    #[test]
    fn test_as_timeout() {
        let err = VigiaError::from(failure());
        assert!(err.is_timeout());
        assert_eq!(err.as_timeout().unwrap().attempts, 16);
        assert!(VigiaError::assertion("x").as_timeout().is_none());
    }

    #[test]
    fn test_constructors() {
        assert!(VigiaError::config("bad").to_string().contains("Configuration"));
        assert!(VigiaError::assertion("nope").to_string().contains("nope"));
        let status = VigiaError::UnexpectedStatus {
            status: 404,
            expected: 200,
            url: "/posts/9999".into(),
        };
        assert!(status.to_string().contains("404"));
        assert!(!status.is_transient());
    }
}
