//! Chromium over the Chrome `DevTools` Protocol.
//!
//! The session owns a small tokio runtime and blocks on it for every call,
//! so callers (waits, page objects, steps) stay synchronous. Element queries
//! are single `Runtime.evaluate` round trips built from
//! [`Selector`](crate::locator::Selector) queries.

#![allow(clippy::significant_drop_tightening, clippy::items_after_statements)]

use super::{BrowserSession, ElementState, PageState};
use crate::driver::DriverConfig;
use crate::locator::Locator;
use crate::result::{VigiaError, VigiaResult};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Replaces `alert`/`confirm` so dialogs never block the page and their
/// messages can be read back through [`BrowserSession::take_alert`].
const DIALOG_HOOK: &str = r"
(() => {
  window.__vigiaAlerts = [];
  window.alert = (msg) => { window.__vigiaAlerts.push(String(msg)); };
  window.confirm = (msg) => { window.__vigiaAlerts.push(String(msg)); return true; };
})();
";

// CDP drops `null` results, so a missing element is reported as `found: false`
fn element_script(query: &str) -> String {
    format!(
        "(() => {{ const el = {query}; \
         if (!el) return {{ found: false, visible: false, enabled: false, text: '' }}; \
         const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
         return {{ found: true, visible: el.isConnected && r.width > 0 && r.height > 0 \
                   && s.visibility !== 'hidden' && s.display !== 'none', \
                   enabled: !el.disabled, \
                   text: (el.innerText || el.textContent || '').trim() }}; }})()"
    )
}

#[derive(Deserialize)]
struct Probe {
    found: bool,
    #[serde(flatten)]
    state: ElementState,
}

fn click_script(query: &str) -> String {
    format!(
        "(() => {{ const el = {query}; if (!el) return 'missing'; \
         const r = el.getBoundingClientRect(); \
         if (r.width === 0 || r.height === 0) return 'hidden'; \
         if (el.disabled) return 'disabled'; \
         el.scrollIntoView({{ block: 'center' }}); el.click(); return 'ok'; }})()"
    )
}

fn fill_script(query: &str, value: &str) -> String {
    let literal = serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{ const el = {query}; if (!el) return 'missing'; \
         if (el.disabled || el.readOnly) return 'disabled'; \
         el.focus(); el.value = {literal}; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); return 'ok'; }})()"
    )
}

/// Map a CDP failure, keeping navigation races transient
fn map_cdp_error(e: CdpError) -> VigiaError {
    let message = match e {
        CdpError::JavascriptException(details) => return VigiaError::script(details.text),
        other => other.to_string(),
    };
    if message.contains("Execution context was destroyed")
        || message.contains("Cannot find context")
        || message.contains("Cannot find default execution context")
    {
        return VigiaError::DocumentNotReady {
            ready_state: "navigating".to_string(),
        };
    }
    VigiaError::browser(message)
}

fn interaction_error(status: &str, locator: &Locator) -> VigiaResult<()> {
    let selector = locator.selector().to_string();
    match status {
        "ok" => Ok(()),
        "missing" => Err(VigiaError::ElementNotFound { selector }),
        _ => Err(VigiaError::NotInteractable { selector }),
    }
}

/// Live Chromium session
pub struct ChromiumSession {
    runtime: Runtime,
    browser: Option<Browser>,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumSession")
            .field("open", &self.browser.is_some())
            .finish_non_exhaustive()
    }
}

impl ChromiumSession {
    /// Launch Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns [`VigiaError::BrowserLaunch`] if the runtime, the browser
    /// process or the first page cannot be created.
    pub fn launch(config: &DriverConfig) -> VigiaResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("vigia-cdp")
            .enable_all()
            .build()
            .map_err(|e| VigiaError::BrowserLaunch {
                message: e.to_string(),
            })?;

        let mut builder = CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|message| VigiaError::BrowserLaunch { message })?;

        let (browser, mut handler) = runtime
            .block_on(Browser::launch(cdp_config))
            .map_err(|e| VigiaError::BrowserLaunch {
                message: e.to_string(),
            })?;

        let handle = runtime.spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = runtime
            .block_on(async {
                let page = browser.new_page("about:blank").await?;
                page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                    DIALOG_HOOK,
                ))
                .await?;
                Ok::<_, CdpError>(page)
            })
            .map_err(|e| VigiaError::BrowserLaunch {
                message: e.to_string(),
            })?;

        info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "chromium launched"
        );

        Ok(Self {
            runtime,
            browser: Some(browser),
            page,
            handler: handle,
        })
    }

    fn ensure_open(&self) -> VigiaResult<()> {
        if self.browser.is_none() {
            return Err(VigiaError::browser("session already closed"));
        }
        Ok(())
    }

    fn eval<T: DeserializeOwned>(&self, expression: String) -> VigiaResult<T> {
        self.ensure_open()?;
        let page = self.page.clone();
        let result = self
            .runtime
            .block_on(async move { page.evaluate(expression).await })
            .map_err(map_cdp_error)?;
        result
            .into_value::<T>()
            .map_err(|e| VigiaError::script(e.to_string()))
    }
}

impl BrowserSession for ChromiumSession {
    fn name(&self) -> &str {
        "chromium"
    }

    fn navigate(&self, url: &str) -> VigiaResult<()> {
        self.ensure_open()?;
        debug!(url, "navigating");
        let page = self.page.clone();
        let target = url.to_string();
        self.runtime
            .block_on(async move { page.goto(target).await.map(|_| ()) })
            .map_err(|e| VigiaError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    fn current_state(&self) -> VigiaResult<PageState> {
        self.eval(
            "({ title: document.title, url: location.href, ready_state: document.readyState })"
                .to_string(),
        )
    }

    fn element_state(&self, locator: &Locator) -> VigiaResult<ElementState> {
        let probe: Probe = self.eval(element_script(&locator.selector().to_query()))?;
        if !probe.found {
            return Err(VigiaError::ElementNotFound {
                selector: locator.selector().to_string(),
            });
        }
        Ok(probe.state)
    }

    fn count(&self, locator: &Locator) -> VigiaResult<usize> {
        self.eval(locator.selector().to_count_query())
    }

    fn texts(&self, locator: &Locator) -> VigiaResult<Vec<String>> {
        self.eval(format!(
            "{}.map(el => (el.innerText || el.textContent || '').trim())",
            locator.selector().to_all_query()
        ))
    }

    fn click(&self, locator: &Locator) -> VigiaResult<()> {
        debug!(selector = %locator.selector(), "click");
        let status: String = self.eval(click_script(&locator.selector().to_query()))?;
        interaction_error(&status, locator)
    }

    fn fill(&self, locator: &Locator, text: &str) -> VigiaResult<()> {
        let status: String = self.eval(fill_script(&locator.selector().to_query(), text))?;
        interaction_error(&status, locator)
    }

    fn take_alert(&self) -> VigiaResult<Option<String>> {
        let next: Vec<String> = self.eval(
            "[(window.__vigiaAlerts || []).shift()].filter(m => m !== undefined)".to_string(),
        )?;
        Ok(next.into_iter().next())
    }

    fn screenshot(&self) -> VigiaResult<Vec<u8>> {
        self.ensure_open()?;
        let page = self.page.clone();
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self
            .runtime
            .block_on(async move { page.execute(params).await })
            .map_err(map_cdp_error)?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| VigiaError::browser(format!("screenshot decode failed: {e}")))
    }

    fn page_source(&self) -> VigiaResult<String> {
        self.ensure_open()?;
        let page = self.page.clone();
        self.runtime
            .block_on(async move { page.content().await })
            .map_err(map_cdp_error)
    }

    fn quit(&mut self) -> VigiaResult<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = self.runtime.block_on(async move {
            let closed = browser.close().await.map(|_| ());
            let _ = browser.wait().await;
            closed
        });
        self.handler.abort();
        info!("chromium closed");
        closed.map_err(|e| VigiaError::browser(e.to_string()))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            let _ = self.quit();
        }
    }
}
