//! Locator descriptors for element selection.
//!
//! A [`Locator`] is a plain value: it names *how* to find an element and is
//! resolved lazily by a [`BrowserSession`](crate::session::BrowserSession)
//! each time it is queried. Page objects build them in small constructor
//! functions at the point of use.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Any element whose text content contains the string
    Text(String),
    /// Element id attribute
    Id(String),
    /// Anchor whose visible text equals the string
    LinkText(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

/// Quote a string as a JavaScript literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a link-text selector
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// JavaScript expression evaluating to an array of all matching elements
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_string(s)),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()",
                js_string(s)
            ),
            Self::Text(t) => format!(
                "Array.from(document.body ? document.body.querySelectorAll('*') : []) \
                 .filter(el => el.children.length === 0 && el.textContent.includes({}))",
                js_string(t)
            ),
            Self::Id(id) => format!(
                "[document.getElementById({})].filter(el => el !== null)",
                js_string(id)
            ),
            Self::LinkText(t) => format!(
                "Array.from(document.querySelectorAll('a')).filter(el => el.textContent.trim() === {})",
                js_string(t)
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from(document.querySelectorAll({})).filter(el => el.textContent.includes({}))",
                js_string(css),
                js_string(text)
            ),
        }
    }

    /// JavaScript expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({})", js_string(s)),
            Self::Id(id) => format!("document.getElementById({})", js_string(id)),
            other => format!("({}[0] || null)", other.to_all_query()),
        }
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_all_query())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::Id(id) => write!(f, "#{id}"),
            Self::LinkText(t) => write!(f, "link={t}"),
            Self::CssWithText { css, text } => write!(f, "{css} >> text={text}"),
        }
    }
}

/// A named element descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    selector: Selector,
    description: Option<String>,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            description: None,
        }
    }

    /// Attach a human-readable name used in wait failures
    #[must_use]
    pub fn named(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Filter by text content
    ///
    /// Only CSS locators can be narrowed this way; other selector kinds are
    /// returned unchanged.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let selector = match self.selector {
            Selector::Css(css) => Selector::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        };
        Self {
            selector,
            description: self.description,
        }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Human-readable name: the description if set, else the selector
    #[must_use]
    pub fn describe(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.selector.to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description {
            Some(ref d) => write!(f, "{d} ({})", self.selector),
            None => write!(f, "{}", self.selector),
        }
    }
}

/// Shorthand for a CSS locator
#[must_use]
pub fn css(selector: impl Into<String>) -> Locator {
    Locator::new(selector)
}

/// Shorthand for an XPath locator
#[must_use]
pub fn xpath(expr: impl Into<String>) -> Locator {
    Locator::from_selector(Selector::xpath(expr))
}

/// Shorthand for an id locator
#[must_use]
pub fn id(id: impl Into<String>) -> Locator {
    Locator::from_selector(Selector::id(id))
}

/// Shorthand for a link-text locator
#[must_use]
pub fn link_text(text: impl Into<String>) -> Locator {
    Locator::from_selector(Selector::link_text(text))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let s = Selector::css("#tbodyid .card");
            assert_eq!(s.to_query(), "document.querySelector(\"#tbodyid .card\")");
            assert_eq!(
                s.to_count_query(),
                "Array.from(document.querySelectorAll(\"#tbodyid .card\")).length"
            );
        }

        #[test]
        fn test_id_query() {
            let s = Selector::id("totalp");
            assert_eq!(s.to_query(), "document.getElementById(\"totalp\")");
            assert!(s.to_all_query().contains("filter(el => el !== null)"));
        }

        #[test]
        fn test_css_with_text_query() {
            let s = Selector::CssWithText {
                css: "#itemc".into(),
                text: "Phones".into(),
            };
            let q = s.to_query();
            assert!(q.contains("querySelectorAll(\"#itemc\")"));
            assert!(q.contains("includes(\"Phones\")"));
            assert!(q.ends_with("[0] || null)"));
        }

        #[test]
        fn test_xpath_query_uses_snapshot() {
            let s = Selector::xpath("//a[text()='Delete']");
            assert!(s.to_all_query().contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert!(s.to_all_query().contains("\"//a[text()='Delete']\""));
        }

        #[test]
        fn test_quotes_are_escaped() {
            let s = Selector::text("say \"hi\"");
            assert!(s.to_all_query().contains(r#""say \"hi\"""#));
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css(".name").to_string(), ".name");
            assert_eq!(Selector::id("cartur").to_string(), "#cartur");
            assert_eq!(Selector::link_text("Cart").to_string(), "link=Cart");
            assert_eq!(
                Selector::CssWithText {
                    css: "a".into(),
                    text: "Laptops".into()
                }
                .to_string(),
                "a >> text=Laptops"
            );
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_with_text_narrows_css() {
            let loc = css("#itemc").with_text("Monitors");
            assert_eq!(
                loc.selector(),
                &Selector::CssWithText {
                    css: "#itemc".into(),
                    text: "Monitors".into()
                }
            );
        }

        #[test]
        fn test_with_text_keeps_other_kinds() {
            let loc = id("cartur").with_text("Cart");
            assert_eq!(loc.selector(), &Selector::id("cartur"));
        }

        #[test]
        fn test_describe_prefers_name() {
            let loc = css("#totalp").named("cart total");
            assert_eq!(loc.describe(), "cart total");
            assert_eq!(loc.to_string(), "cart total (#totalp)");
            assert_eq!(css("#totalp").describe(), "#totalp");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_queries_embed_valid_js_literal(text in ".*") {
                let query = Selector::text(text.clone()).to_all_query();
                let literal = serde_json::to_string(&text).unwrap();
                prop_assert!(query.contains(&literal));
            }
        }
    }
}
