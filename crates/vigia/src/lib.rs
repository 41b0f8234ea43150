//! Vigia: end-to-end scenarios for a REST API and a web storefront.
//!
//! Everything that waits goes through one polling utility with a tri-state
//! outcome: ready, timed out (with a description of what was awaited and a
//! snapshot of the last observed state), or failed with an error that
//! retrying cannot fix.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │  Scenarios   │───►│ Page objects │───►│ Waiter (facade) │
//! │ (suites::*)  │    │  (pages::*)  │    │   wait::Poller  │
//! └──────┬───────┘    └──────────────┘    └────────┬────────┘
//!        │                                         │
//!        ▼                                         ▼
//! ┌──────────────┐                        ┌─────────────────┐
//! │  ApiClient   │                        │ BrowserSession  │
//! │  (reqwest)   │                        │ chromium | test │
//! └──────────────┘                        └─────────────────┘
//! ```
//!
//! The harness is synchronous. Browser sessions hide their async driver
//! behind a private runtime; the HTTP client is blocking.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays))]

pub mod api;
pub mod config;
pub mod driver;
pub mod evidence;
pub mod locator;
pub mod logging;
pub mod offline;
pub mod pages;
pub mod reporter;
mod result;
pub mod scenario;
pub mod session;
pub mod suites;
pub mod wait;

pub use config::{EnvironmentConfig, Timeouts};
pub use driver::{BrowserKind, DriverConfig, DriverManager, SessionGuard};
pub use evidence::{Evidence, EvidenceSink, FileEvidenceSink, NullEvidenceSink};
pub use locator::{Locator, Selector};
pub use result::{TimeoutFailure, VigiaError, VigiaResult};
pub use scenario::{Feature, RunSummary, Scenario, ScenarioRunner, World};
pub use session::{BrowserSession, ElementState, PageState, ReadyState, ScriptedSession};
pub use wait::{Check, Poller, TimeoutTier, WaitConfig, Waiter};

#[cfg(feature = "browser")]
pub use session::ChromiumSession;
