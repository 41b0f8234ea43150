//! Failure evidence: screenshot, page source and a log excerpt.
//!
//! Capture is best-effort. Each artifact is attempted independently and
//! problems are collected into [`Evidence::errors`] instead of aborting, so
//! a dead browser still leaves the log behind.

use crate::result::{VigiaError, VigiaResult};
use crate::session::BrowserSession;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Files written for one failed scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// PNG screenshot
    pub screenshot: Option<PathBuf>,
    /// Page source
    pub page_source: Option<PathBuf>,
    /// Failure log
    pub log: Option<PathBuf>,
    /// Artifacts that could not be captured, with the reason
    pub errors: Vec<String>,
}

impl Evidence {
    /// Whether nothing was written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screenshot.is_none() && self.page_source.is_none() && self.log.is_none()
    }

    /// Every path that was written
    #[must_use]
    pub fn files(&self) -> Vec<&Path> {
        [&self.screenshot, &self.page_source, &self.log]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
            .collect()
    }
}

/// Destination for failure artifacts
pub trait EvidenceSink: Send + Sync {
    /// Capture what the session can provide, plus `log`
    fn capture(
        &self,
        scenario: &str,
        session: Option<&dyn BrowserSession>,
        log: &str,
    ) -> Evidence;
}

/// Discards everything; used when evidence is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEvidenceSink;

impl EvidenceSink for NullEvidenceSink {
    fn capture(&self, _scenario: &str, _session: Option<&dyn BrowserSession>, _log: &str) -> Evidence {
        Evidence::default()
    }
}

/// Writes `<dir>/<slug>-<timestamp>.{png,html,log}`
#[derive(Debug, Clone)]
pub struct FileEvidenceSink {
    dir: PathBuf,
}

impl FileEvidenceSink {
    /// Sink writing into `dir` (created on first capture)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, stem: &str, extension: &str, bytes: &[u8]) -> VigiaResult<PathBuf> {
        let path = self.dir.join(format!("{stem}.{extension}"));
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Lower-case file-name stem: alphanumerics kept, runs of anything else
/// collapsed to one `-`
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "scenario".to_string()
    } else {
        trimmed.to_string()
    }
}

fn record<T>(errors: &mut Vec<String>, what: &str, result: VigiaResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(artifact = what, error = %e, "evidence capture failed");
            errors.push(format!("{what}: {e}"));
            None
        }
    }
}

impl EvidenceSink for FileEvidenceSink {
    fn capture(&self, scenario: &str, session: Option<&dyn BrowserSession>, log: &str) -> Evidence {
        let mut evidence = Evidence::default();
        if let Err(e) = fs::create_dir_all(&self.dir) {
            let e = VigiaError::Evidence {
                message: format!("cannot create {}: {e}", self.dir.display()),
            };
            evidence.errors.push(e.to_string());
            return evidence;
        }

        let stem = format!("{}-{}", slug(scenario), Utc::now().format("%Y%m%dT%H%M%S%.3fZ"));
        let errors = &mut evidence.errors;

        if let Some(session) = session {
            let png = record(errors, "screenshot", session.screenshot())
                .and_then(|bytes| record(errors, "screenshot", self.write(&stem, "png", &bytes)));
            evidence.screenshot = png;

            let html = record(errors, "page source", session.page_source())
                .and_then(|html| record(errors, "page source", self.write(&stem, "html", html.as_bytes())));
            evidence.page_source = html;
        }

        evidence.log = record(errors, "log", self.write(&stem, "log", log.as_bytes()));
        tracing::info!(scenario, files = evidence.files().len(), "evidence captured");
        evidence
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::session::{ScriptedElement, ScriptedSession};
    use tempfile::TempDir;

    mod slug_tests {
        use super::*;

        #[test]
        fn test_slug_collapses_separators() {
            assert_eq!(slug("Cart total -- after delete!"), "cart-total-after-delete");
        }

        #[test]
        fn test_slug_of_punctuation_only() {
            assert_eq!(slug("!!!"), "scenario");
        }
    }

    mod file_sink_tests {
        use super::*;

        #[test]
        fn test_captures_all_artifacts() {
            let dir = TempDir::new().unwrap();
            let session = ScriptedSession::new();
            session.set_title("STORE");
            session.set_element("#totalp", ScriptedElement::visible("1010"));
            let sink = FileEvidenceSink::new(dir.path().join("evidence"));

            let evidence = sink.capture("Place order", Some(&session), "step failed");

            assert!(evidence.errors.is_empty(), "{:?}", evidence.errors);
            assert_eq!(evidence.files().len(), 3);
            let html = fs::read_to_string(evidence.page_source.unwrap()).unwrap();
            assert!(html.contains("#totalp"));
            let log = evidence.log.unwrap();
            assert!(log
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("place-order-"));
            assert_eq!(fs::read_to_string(log).unwrap(), "step failed");
        }

        #[test]
        fn test_closed_session_still_writes_log() {
            let dir = TempDir::new().unwrap();
            let mut session = ScriptedSession::new();
            crate::session::BrowserSession::quit(&mut session).unwrap();
            let sink = FileEvidenceSink::new(dir.path());

            let evidence = sink.capture("dead browser", Some(&session), "boom");

            assert!(evidence.screenshot.is_none());
            assert!(evidence.page_source.is_none());
            assert!(evidence.log.is_some());
            assert_eq!(evidence.errors.len(), 2);
            assert!(evidence.errors[0].starts_with("screenshot:"));
        }

        #[test]
        fn test_without_session_only_log() {
            let dir = TempDir::new().unwrap();
            let evidence = FileEvidenceSink::new(dir.path()).capture("api", None, "404");
            assert_eq!(evidence.files().len(), 1);
        }
    }

    #[test]
    fn test_null_sink_writes_nothing() {
        let session = ScriptedSession::new();
        assert!(NullEvidenceSink.capture("x", Some(&session), "log").is_empty());
    }
}
