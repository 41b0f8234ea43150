//! In-memory browser session.
//!
//! `ScriptedSession` keeps a small model of a page (title, URL, ready state,
//! elements keyed by selector) behind a mutex. Tests and the offline
//! storefront mutate it directly or register transitions:
//!
//! - [`ScriptedSession::after_queries`] runs a closure once the session has
//!   answered a given number of queries, which is how "element appears
//!   after a few polls" is modelled;
//! - [`ScriptedSession::on_click`] and [`ScriptedSession::on_navigate`]
//!   react to user actions;
//! - [`ScriptedSession::fail_next`] makes the next queries return errors.

use super::{BrowserSession, ElementState, PageState, ReadyState};
use crate::locator::{Locator, Selector};
use crate::result::{VigiaError, VigiaResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

type Transition = Box<dyn FnOnce(&mut ScriptedState) + Send>;
type ClickHandler = Arc<dyn Fn(&mut ScriptedState, &ScriptedElement) + Send + Sync>;
type NavigateHandler = Arc<dyn Fn(&mut ScriptedState, &str) + Send + Sync>;
type ErrorFactory = Box<dyn Fn() -> VigiaError + Send>;

/// A modelled DOM element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedElement {
    /// Rendered and not hidden
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Text content
    pub text: String,
    /// Input value (set by `fill`)
    pub value: String,
}

impl ScriptedElement {
    /// A visible, enabled element with the given text
    #[must_use]
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            visible: true,
            enabled: true,
            text: text.into(),
            value: String::new(),
        }
    }

    /// A present but hidden element
    #[must_use]
    pub fn hidden(text: impl Into<String>) -> Self {
        Self {
            visible: false,
            ..Self::visible(text)
        }
    }

    /// Mark the element disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn state(&self) -> ElementState {
        ElementState {
            visible: self.visible,
            enabled: self.enabled,
            text: self.text.trim().to_string(),
        }
    }
}

/// Mutable model behind a [`ScriptedSession`]
pub struct ScriptedState {
    /// Document title
    pub title: String,
    /// Current URL
    pub url: String,
    /// Document ready state
    pub ready_state: ReadyState,
    elements: HashMap<String, Vec<ScriptedElement>>,
    alerts: VecDeque<String>,
    queries: usize,
    transitions: Vec<(usize, Transition)>,
    click_handlers: HashMap<String, ClickHandler>,
    navigate_handler: Option<NavigateHandler>,
    pending_errors: VecDeque<ErrorFactory>,
    clicks: Vec<String>,
    closed: bool,
}

impl std::fmt::Debug for ScriptedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedState")
            .field("title", &self.title)
            .field("url", &self.url)
            .field("ready_state", &self.ready_state)
            .field("elements", &self.elements.len())
            .field("queries", &self.queries)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Default for ScriptedState {
    fn default() -> Self {
        Self {
            title: String::new(),
            url: "about:blank".to_string(),
            ready_state: ReadyState::Complete,
            elements: HashMap::new(),
            alerts: VecDeque::new(),
            queries: 0,
            transitions: Vec::new(),
            click_handlers: HashMap::new(),
            navigate_handler: None,
            pending_errors: VecDeque::new(),
            clicks: Vec::new(),
            closed: false,
        }
    }
}

impl ScriptedState {
    /// Replace every element stored under `key`
    pub fn set_elements(&mut self, key: impl Into<String>, elements: Vec<ScriptedElement>) {
        let _ = self.elements.insert(key.into(), elements);
    }

    /// Store a single element under `key`
    pub fn set_element(&mut self, key: impl Into<String>, element: ScriptedElement) {
        self.set_elements(key, vec![element]);
    }

    /// Drop every element stored under `key`
    pub fn remove(&mut self, key: &str) {
        let _ = self.elements.remove(key);
    }

    /// Remove all elements
    pub fn clear_elements(&mut self) {
        self.elements.clear();
    }

    /// Mutable access to the elements under `key`
    pub fn elements_mut(&mut self, key: &str) -> Option<&mut Vec<ScriptedElement>> {
        self.elements.get_mut(key)
    }

    /// Elements stored under `key`
    #[must_use]
    pub fn elements(&self, key: &str) -> &[ScriptedElement] {
        self.elements.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Set visibility of every element under `key`
    pub fn set_visible(&mut self, key: &str, visible: bool) {
        if let Some(elements) = self.elements.get_mut(key) {
            for el in elements {
                el.visible = visible;
            }
        }
    }

    /// Queue a JS alert message
    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    /// Schedule a transition `queries_from_now` queries in the future
    pub fn after_queries(
        &mut self,
        queries_from_now: usize,
        transition: impl FnOnce(&mut Self) + Send + 'static,
    ) {
        let due = self.queries + queries_from_now;
        self.transitions.push((due, Box::new(transition)));
    }

    /// Register a click reaction for elements stored under `key`
    pub fn on_click(
        &mut self,
        key: impl Into<String>,
        handler: impl Fn(&mut Self, &ScriptedElement) + Send + Sync + 'static,
    ) {
        let _ = self.click_handlers.insert(key.into(), Arc::new(handler));
    }

    fn resolve(&self, selector: &Selector) -> Vec<ScriptedElement> {
        match selector {
            Selector::CssWithText { css, text } => self
                .elements(css)
                .iter()
                .filter(|el| el.text.contains(text.as_str()))
                .cloned()
                .collect(),
            Selector::Text(text) => self
                .elements
                .values()
                .flatten()
                .filter(|el| el.text.contains(text.as_str()))
                .cloned()
                .collect(),
            other => self.elements(&other.to_string()).to_vec(),
        }
    }

    fn click_handler(&self, selector: &Selector) -> Option<ClickHandler> {
        self.click_handlers
            .get(&selector.to_string())
            .or_else(|| match selector {
                Selector::CssWithText { css, .. } => self.click_handlers.get(css),
                _ => None,
            })
            .cloned()
    }

    fn value_mut(&mut self, selector: &Selector) -> Option<&mut ScriptedElement> {
        match selector {
            Selector::CssWithText { css, text } => self
                .elements
                .get_mut(css)?
                .iter_mut()
                .find(|el| el.text.contains(text.as_str())),
            other => self.elements.get_mut(&other.to_string())?.first_mut(),
        }
    }
}

/// In-memory [`BrowserSession`] driven by a [`ScriptedState`]
#[derive(Debug, Clone, Default)]
pub struct ScriptedSession {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedSession {
    /// Create an empty session on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the model directly
    pub fn with_state<R>(&self, f: impl FnOnce(&mut ScriptedState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Set the document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = title.into();
    }

    /// Set the ready state
    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.lock().ready_state = ready_state;
    }

    /// Store a single element under `key`
    pub fn set_element(&self, key: impl Into<String>, element: ScriptedElement) {
        self.lock().set_element(key, element);
    }

    /// Drop every element stored under `key`
    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Schedule a transition `queries_from_now` queries in the future
    pub fn after_queries(
        &self,
        queries_from_now: usize,
        transition: impl FnOnce(&mut ScriptedState) + Send + 'static,
    ) {
        self.lock().after_queries(queries_from_now, transition);
    }

    /// Register a click reaction for elements stored under `key`
    pub fn on_click(
        &self,
        key: impl Into<String>,
        handler: impl Fn(&mut ScriptedState, &ScriptedElement) + Send + Sync + 'static,
    ) {
        self.lock().on_click(key, handler);
    }

    /// Register the reaction to `navigate`
    pub fn on_navigate(&self, handler: impl Fn(&mut ScriptedState, &str) + Send + Sync + 'static) {
        self.lock().navigate_handler = Some(Arc::new(handler));
    }

    /// Make the next `times` queries fail with errors built by `factory`
    pub fn fail_next(&self, times: usize, factory: impl Fn() -> VigiaError + Send + Clone + 'static) {
        let mut state = self.lock();
        for _ in 0..times {
            state.pending_errors.push_back(Box::new(factory.clone()));
        }
    }

    /// Queries answered so far
    #[must_use]
    pub fn queries(&self) -> usize {
        self.lock().queries
    }

    /// Selectors clicked so far, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    /// Whether `quit` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Count a query, fire due transitions, then surface any injected error.
    fn begin_query(&self) -> VigiaResult<MutexGuard<'_, ScriptedState>> {
        let mut state = self.lock();
        if state.closed {
            return Err(VigiaError::browser("session already closed"));
        }
        state.queries += 1;
        let now = state.queries;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.transitions)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        state.transitions = pending;
        for (_, transition) in due {
            transition(&mut *state);
        }
        if let Some(factory) = state.pending_errors.pop_front() {
            return Err(factory());
        }
        Ok(state)
    }
}

fn not_found(locator: &Locator) -> VigiaError {
    VigiaError::ElementNotFound {
        selector: locator.selector().to_string(),
    }
}

impl BrowserSession for ScriptedSession {
    fn name(&self) -> &str {
        "scripted"
    }

    fn navigate(&self, url: &str) -> VigiaResult<()> {
        let mut state = self.begin_query()?;
        state.url = url.to_string();
        if let Some(handler) = state.navigate_handler.clone() {
            handler(&mut *state, url);
        }
        Ok(())
    }

    fn current_state(&self) -> VigiaResult<PageState> {
        let state = self.begin_query()?;
        Ok(PageState {
            title: state.title.clone(),
            url: state.url.clone(),
            ready_state: state.ready_state,
        })
    }

    fn element_state(&self, locator: &Locator) -> VigiaResult<ElementState> {
        let state = self.begin_query()?;
        state
            .resolve(locator.selector())
            .first()
            .map(ScriptedElement::state)
            .ok_or_else(|| not_found(locator))
    }

    fn count(&self, locator: &Locator) -> VigiaResult<usize> {
        let state = self.begin_query()?;
        Ok(state.resolve(locator.selector()).len())
    }

    fn texts(&self, locator: &Locator) -> VigiaResult<Vec<String>> {
        let state = self.begin_query()?;
        Ok(state
            .resolve(locator.selector())
            .iter()
            .map(|el| el.text.trim().to_string())
            .collect())
    }

    fn click(&self, locator: &Locator) -> VigiaResult<()> {
        let mut state = self.begin_query()?;
        let element = state
            .resolve(locator.selector())
            .into_iter()
            .next()
            .ok_or_else(|| not_found(locator))?;
        if !element.visible || !element.enabled {
            return Err(VigiaError::NotInteractable {
                selector: locator.selector().to_string(),
            });
        }
        state.clicks.push(locator.selector().to_string());
        if let Some(handler) = state.click_handler(locator.selector()) {
            handler(&mut *state, &element);
        }
        Ok(())
    }

    fn fill(&self, locator: &Locator, text: &str) -> VigiaResult<()> {
        let mut state = self.begin_query()?;
        let element = state
            .value_mut(locator.selector())
            .ok_or_else(|| not_found(locator))?;
        if !element.visible || !element.enabled {
            return Err(VigiaError::NotInteractable {
                selector: locator.selector().to_string(),
            });
        }
        element.value = text.to_string();
        Ok(())
    }

    fn take_alert(&self) -> VigiaResult<Option<String>> {
        let mut state = self.begin_query()?;
        Ok(state.alerts.pop_front())
    }

    fn screenshot(&self) -> VigiaResult<Vec<u8>> {
        let _state = self.begin_query()?;
        // 8-byte PNG signature only; enough for evidence plumbing.
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    fn page_source(&self) -> VigiaResult<String> {
        let state = self.begin_query()?;
        let mut keys: Vec<&String> = state.elements.keys().collect();
        keys.sort();
        let mut html = format!(
            "<html><head><title>{}</title></head><body>\n",
            state.title
        );
        for key in keys {
            for el in &state.elements[key] {
                html.push_str(&format!(
                    "<div data-selector=\"{key}\" data-visible=\"{}\">{}</div>\n",
                    el.visible, el.text
                ));
            }
        }
        html.push_str("</body></html>\n");
        Ok(html)
    }

    fn quit(&mut self) -> VigiaResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}
