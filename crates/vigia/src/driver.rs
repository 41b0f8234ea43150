//! Session lifecycle.
//!
//! [`DriverManager::launch`] is the only place sessions are created, and it
//! hands them out wrapped in a [`SessionGuard`]. The guard quits the browser
//! when it is dropped, so a scenario that fails, panics or returns early
//! still releases its browser.

use crate::config::EnvironmentConfig;
use crate::result::{VigiaError, VigiaResult};
use crate::session::{BrowserSession, ScriptedSession};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which session implementation to launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Real Chromium over CDP (needs the `browser` feature)
    #[default]
    Chromium,
    /// In-memory scripted session
    Scripted,
}

impl BrowserKind {
    /// Config/CLI spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Scripted => "scripted",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = VigiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "scripted" | "offline" => Ok(Self::Scripted),
            other => Err(VigiaError::config(format!(
                "unknown browser '{other}' (expected chromium or scripted)"
            ))),
        }
    }
}

/// Browser launch and navigation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Session implementation
    pub kind: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Extra navigation attempts after the first
    pub navigation_retries: u32,
    /// Base delay between navigation attempts
    pub retry_backoff: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1366,
            viewport_height: 768,
            sandbox: true,
            chromium_path: None,
            navigation_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive launch settings from the environment config
    #[must_use]
    pub fn from_env(env: &EnvironmentConfig) -> Self {
        Self {
            kind: env.browser,
            headless: env.headless,
            navigation_retries: env.navigation_retries,
            ..Self::default()
        }
    }

    /// Set the session implementation
    #[must_use]
    pub const fn kind(mut self, kind: BrowserKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set navigation retries and backoff
    #[must_use]
    pub const fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.navigation_retries = retries;
        self.retry_backoff = backoff;
        self
    }
}

/// Owns a live session and quits it exactly once.
pub struct SessionGuard {
    session: Box<dyn BrowserSession>,
    open: bool,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("session", &self.session.name())
            .field("open", &self.open)
            .finish()
    }
}

impl SessionGuard {
    /// Take ownership of a session
    #[must_use]
    pub fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session,
            open: true,
        }
    }

    /// Borrow the session
    #[must_use]
    pub fn session(&self) -> &dyn BrowserSession {
        &*self.session
    }

    /// Whether the session has not been quit yet
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Quit now and report the result
    ///
    /// # Errors
    ///
    /// Whatever the session's `quit` returns; the guard is closed either way.
    pub fn quit(mut self) -> VigiaResult<()> {
        self.close()
    }

    fn close(&mut self) -> VigiaResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        debug!(session = self.session.name(), "quitting session");
        self.session.quit()
    }
}

impl Deref for SessionGuard {
    type Target = dyn BrowserSession;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "session quit failed during drop");
        }
    }
}

/// Creates sessions from a [`DriverConfig`]
pub struct DriverManager {
    config: DriverConfig,
    scripted: fn() -> ScriptedSession,
}

impl fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DriverManager {
    /// Manager that builds empty scripted sessions for `BrowserKind::Scripted`
    #[must_use]
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            scripted: ScriptedSession::new,
        }
    }

    /// Use `factory` to build scripted sessions
    #[must_use]
    pub fn with_scripted(mut self, factory: fn() -> ScriptedSession) -> Self {
        self.scripted = factory;
        self
    }

    /// Launch settings
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Start a session of the configured kind
    ///
    /// # Errors
    ///
    /// [`VigiaError::BrowserLaunch`] if Chromium cannot start, or
    /// [`VigiaError::Configuration`] when Chromium is requested from a build
    /// without the `browser` feature.
    pub fn launch(&self) -> VigiaResult<SessionGuard> {
        info!(kind = %self.config.kind, headless = self.config.headless, "launching session");
        let session: Box<dyn BrowserSession> = match self.config.kind {
            BrowserKind::Scripted => Box::new((self.scripted)()),
            BrowserKind::Chromium => self.launch_chromium()?,
        };
        Ok(SessionGuard::new(session))
    }

    #[cfg(feature = "browser")]
    fn launch_chromium(&self) -> VigiaResult<Box<dyn BrowserSession>> {
        Ok(Box::new(crate::session::ChromiumSession::launch(&self.config)?))
    }

    #[cfg(not(feature = "browser"))]
    fn launch_chromium(&self) -> VigiaResult<Box<dyn BrowserSession>> {
        Err(VigiaError::config(
            "chromium requested but vigia was built without the `browser` feature",
        ))
    }

    /// Navigate with this manager's retry policy
    pub fn navigate(&self, session: &dyn BrowserSession, url: &str) -> VigiaResult<()> {
        navigate_with_retry(
            session,
            url,
            self.config.navigation_retries,
            self.config.retry_backoff,
        )
    }
}

fn is_retryable(error: &VigiaError) -> bool {
    matches!(error, VigiaError::Navigation { .. }) || error.is_transient()
}

/// Navigate, retrying navigation and transient failures with linear backoff.
///
/// Attempt `n` (1-based) that fails waits `backoff * n` before the next one.
/// Other errors are returned at once.
///
/// # Errors
///
/// The last error once `retries + 1` attempts have failed.
pub fn navigate_with_retry(
    session: &dyn BrowserSession,
    url: &str,
    retries: u32,
    backoff: Duration,
) -> VigiaResult<()> {
    let attempts = retries.saturating_add(1);
    let mut attempt = 1;
    loop {
        match session.navigate(url) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < attempts && is_retryable(&e) => {
                warn!(url, attempt, error = %e, "navigation failed, retrying");
                std::thread::sleep(backoff * attempt);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
