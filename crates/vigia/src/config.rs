//! Environment configuration.
//!
//! Values are resolved in three layers, later ones winning:
//!
//! 1. built-in defaults (public JSONPlaceholder and Demoblaze),
//! 2. a YAML file (`$VIGIA_CONFIG`, else `./vigia.yaml` if present),
//! 3. `VIGIA_*` environment variables.
//!
//! The result is validated once and is read-only afterwards.

use crate::driver::BrowserKind;
use crate::result::{VigiaError, VigiaResult};
use crate::wait::MAX_WAIT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Env var naming the config file
pub const CONFIG_ENV: &str = "VIGIA_CONFIG";

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "vigia.yaml";

/// Default REST API under test
pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Default storefront under test
pub const DEFAULT_STOREFRONT_URL: &str = "https://www.demoblaze.com";

static GLOBAL: OnceLock<EnvironmentConfig> = OnceLock::new();

/// Wait timeout tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    /// Regular waits, seconds
    pub default_timeout_secs: u64,
    /// Short waits, seconds
    pub quick_timeout_secs: u64,
    /// Slow waits, seconds
    pub extended_timeout_secs: u64,
    /// Poll interval, milliseconds
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_timeout_secs: 10,
            quick_timeout_secs: 5,
            extended_timeout_secs: 30,
            poll_interval_ms: 100,
        }
    }
}

/// Resolved environment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Base URL of the REST API
    pub api_base_url: String,
    /// Storefront home URL
    pub storefront_url: String,
    /// Session implementation for UI scenarios
    pub browser: BrowserKind,
    /// Run the browser headless
    pub headless: bool,
    /// Wait tiers
    pub timeouts: Timeouts,
    /// Extra navigation attempts
    pub navigation_retries: u32,
    /// Where failure evidence is written
    pub evidence_dir: PathBuf,
    /// HTTP request timeout, seconds
    pub api_timeout_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storefront_url: DEFAULT_STOREFRONT_URL.to_string(),
            browser: BrowserKind::Chromium,
            headless: true,
            timeouts: Timeouts::default(),
            navigation_retries: 2,
            evidence_dir: PathBuf::from("target/vigia/evidence"),
            api_timeout_secs: 30,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> VigiaResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(VigiaError::config(format!(
            "invalid value for {key}: '{value}' (expected true or false)"
        ))),
    }
}

fn parse_u64(key: &str, value: &str) -> VigiaResult<u64> {
    value.trim().parse().map_err(|_| {
        VigiaError::config(format!(
            "invalid value for {key}: '{value}' (expected a whole number)"
        ))
    })
}

fn check_url(field: &str, url: &str) -> VigiaResult<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(VigiaError::config(format!(
            "{field} must be an http(s) URL, got '{url}'"
        )))
    }
}

impl EnvironmentConfig {
    /// Resolve from the process environment
    ///
    /// # Errors
    ///
    /// [`VigiaError::Configuration`] for unreadable files, bad overrides or
    /// failed validation.
    pub fn load() -> VigiaResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Resolve with a custom variable lookup
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> VigiaResult<Self> {
        let file = lookup(CONFIG_ENV).map(PathBuf::from).or_else(|| {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.exists().then_some(local)
        });
        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file over the defaults (no env overrides, no validation)
    pub fn from_file(path: &Path) -> VigiaResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VigiaError::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_yaml_str(&content)
    }

    /// Parse YAML over the defaults
    pub fn from_yaml_str(content: &str) -> VigiaResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content)
            .map_err(|e| VigiaError::config(format!("invalid config: {e}")))
    }

    /// Apply `VIGIA_*` overrides
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> VigiaResult<()> {
        if let Some(v) = lookup("VIGIA_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("VIGIA_STOREFRONT_URL") {
            self.storefront_url = v;
        }
        if let Some(v) = lookup("VIGIA_BROWSER") {
            self.browser = v.parse()?;
        }
        if let Some(v) = lookup("VIGIA_HEADLESS") {
            self.headless = parse_bool("VIGIA_HEADLESS", &v)?;
        }
        if let Some(v) = lookup("VIGIA_DEFAULT_TIMEOUT") {
            self.timeouts.default_timeout_secs = parse_u64("VIGIA_DEFAULT_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("VIGIA_QUICK_TIMEOUT") {
            self.timeouts.quick_timeout_secs = parse_u64("VIGIA_QUICK_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("VIGIA_EXTENDED_TIMEOUT") {
            self.timeouts.extended_timeout_secs = parse_u64("VIGIA_EXTENDED_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("VIGIA_POLL_INTERVAL_MS") {
            self.timeouts.poll_interval_ms = parse_u64("VIGIA_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("VIGIA_EVIDENCE_DIR") {
            self.evidence_dir = PathBuf::from(v);
        }
        Ok(())
    }

    /// Reject configs no wait or client could run with
    pub fn validate(&self) -> VigiaResult<()> {
        check_url("api_base_url", &self.api_base_url)?;
        check_url("storefront_url", &self.storefront_url)?;

        let t = &self.timeouts;
        for (name, secs) in [
            ("default_timeout_secs", t.default_timeout_secs),
            ("quick_timeout_secs", t.quick_timeout_secs),
            ("extended_timeout_secs", t.extended_timeout_secs),
            ("api_timeout_secs", self.api_timeout_secs),
        ] {
            if secs == 0 {
                return Err(VigiaError::config(format!("{name} must be greater than zero")));
            }
            if secs > MAX_WAIT_TIMEOUT_SECS {
                return Err(VigiaError::config(format!(
                    "{name} ({secs}) exceeds the {MAX_WAIT_TIMEOUT_SECS}s limit"
                )));
            }
        }
        if t.poll_interval_ms == 0 {
            return Err(VigiaError::config("poll_interval_ms must be greater than zero"));
        }
        if t.poll_interval_ms > t.quick_timeout_secs.saturating_mul(1000) {
            return Err(VigiaError::config(format!(
                "poll_interval_ms ({}) exceeds the quick timeout ({}s)",
                t.poll_interval_ms, t.quick_timeout_secs
            )));
        }
        Ok(())
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> VigiaResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Process-wide config, loaded on first use
    ///
    /// Concurrent first calls may each load, but only one result is kept.
    pub fn global() -> VigiaResult<&'static Self> {
        if let Some(config) = GLOBAL.get() {
            return Ok(config);
        }
        let loaded = Self::load()?;
        Ok(GLOBAL.get_or_init(|| loaded))
    }

    /// Storefront URL with `path` appended
    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        join(&self.storefront_url, path)
    }

    /// API URL with `path` appended
    #[must_use]
    pub fn api(&self, path: &str) -> String {
        join(&self.api_base_url, path)
    }
}

fn join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}")
    }
}
