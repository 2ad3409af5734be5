//! Selectors for locating storefront elements.
//!
//! A [`Selector`] is a plain value: the CDP backend compiles it into a DOM
//! query, the simulated store matches it against its rendered page model.
//! Text matching is always a case-sensitive substring test on the element's
//! text content.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., `input[data-qa="login-email"]`)
    Css(String),
    /// Any element whose text contains the given string
    Text(String),
    /// CSS selector with a text filter
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// `target` elements inside the first `container` that holds an `anchor` match
    Scoped {
        /// Container CSS selector (e.g., a product card)
        container: String,
        /// Element that identifies the container
        anchor: Box<Selector>,
        /// CSS selector of the elements to return, relative to the container
        target: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a CSS selector filtered by text content
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Select `target` inside the first `container` holding `anchor`
    #[must_use]
    pub fn scoped(container: impl Into<String>, anchor: Self, target: impl Into<String>) -> Self {
        Self::Scoped {
            container: container.into(),
            anchor: Box::new(anchor),
            target: target.into(),
        }
    }

    /// JavaScript expression evaluating to the array of matching elements,
    /// in document order.
    #[must_use]
    pub fn to_query(&self) -> String {
        self.query_within("document")
    }

    fn query_within(&self, root: &str) -> String {
        match self {
            Self::Css(css) => format!("Array.from({root}.querySelectorAll({}))", js_str(css)),
            Self::Text(text) => format!(
                "Array.from({root}.querySelectorAll('body *')).filter(el => el.textContent.includes({})).reverse()",
                js_str(text)
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from({root}.querySelectorAll({})).filter(el => el.textContent.includes({}))",
                js_str(css),
                js_str(text)
            ),
            Self::Scoped {
                container,
                anchor,
                target,
            } => format!(
                "(() => {{ const c = Array.from({root}.querySelectorAll({})).find(c => {}.length > 0); return c ? Array.from(c.querySelectorAll({})) : []; }})()",
                js_str(container),
                anchor.query_within("c"),
                js_str(target)
            ),
        }
    }

    /// Script returning `{count, text, visible}` for the first match, or `null`.
    #[must_use]
    pub fn to_probe_script(&self) -> String {
        format!(
            "(() => {{ const els = {}; const el = els[0]; if (!el) return null; \
             const style = window.getComputedStyle(el); \
             const visible = style.visibility !== 'hidden' && style.display !== 'none' && el.getClientRects().length > 0; \
             const all_text = Array.from(els).map(e => (e.textContent || '').trim()).join(' '); \
             return {{ count: els.length, text: (el.textContent || '').trim(), all_text, visible }}; }})()",
            self.to_query()
        )
    }

    /// Script clicking the first match; returns `false` when nothing matched.
    #[must_use]
    pub fn to_click_script(&self) -> String {
        format!(
            "(() => {{ const el = {}[0]; if (!el) return false; el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()",
            self.to_query()
        )
    }

    /// Script focusing the first match so typed input lands in it
    #[must_use]
    pub fn to_focus_script(&self) -> String {
        format!(
            "(() => {{ const el = {}[0]; if (!el) return false; el.scrollIntoView({{block: 'center'}}); el.focus(); return true; }})()",
            self.to_query()
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "{css}"),
            Self::Text(text) => write!(f, "text {text:?}"),
            Self::CssWithText { css, text } => write!(f, "{css} containing {text:?}"),
            Self::Scoped {
                container,
                anchor,
                target,
            } => write!(f, "{target} within {container} holding [{anchor}]"),
        }
    }
}

/// Encode a string as a JavaScript string literal.
fn js_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Snapshot of the first element matched by a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Number of elements matched
    pub count: usize,
    /// Trimmed text content of the first match
    pub text: String,
    /// Trimmed text of every match, joined with single spaces
    #[serde(default)]
    pub all_text: String,
    /// Whether the first match is rendered and visible
    pub visible: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_css_query() {
        let sel = Selector::css("a.add-to-cart");
        assert_eq!(
            sel.to_query(),
            "Array.from(document.querySelectorAll(\"a.add-to-cart\"))"
        );
    }

    #[test]
    fn test_text_is_escaped_as_js_literal() {
        let sel = Selector::css_with_text("h2", "It's \"All\" Products");
        let query = sel.to_query();
        assert!(query.contains(r#""It's \"All\" Products""#));
        assert!(query.contains(".includes("));
    }

    #[test]
    fn test_scoped_query_searches_inside_container() {
        let sel = Selector::scoped(
            ".single-products",
            Selector::css_with_text(".productinfo p", "Blue Top"),
            "a.add-to-cart",
        );
        let query = sel.to_query();
        assert!(query.contains("document.querySelectorAll(\".single-products\")"));
        assert!(query.contains("c.querySelectorAll(\".productinfo p\")"));
        assert!(query.contains("c.querySelectorAll(\"a.add-to-cart\")"));
    }

    #[test]
    fn test_probe_script_wraps_query() {
        let sel = Selector::text("Logged in as");
        let script = sel.to_probe_script();
        assert!(script.contains(&sel.to_query()));
        assert!(script.contains("visible"));
        assert!(script.contains("all_text"));
    }

    #[test]
    fn test_focus_and_click_scripts_report_misses() {
        let sel = Selector::css(r#"input[data-qa="cvc"]"#);
        assert!(sel.to_focus_script().contains("el.focus()"));
        assert!(sel.to_click_script().contains("return false"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Selector::css_with_text("a.btn", "Place Order").to_string(),
            "a.btn containing \"Place Order\""
        );
        assert_eq!(Selector::text("Added!").to_string(), "text \"Added!\"");
    }

    #[test]
    fn test_element_state_deserializes_probe_output() {
        let state: ElementState =
            serde_json::from_str(r#"{"count":2,"text":"Blue Top","visible":true}"#).unwrap();
        assert_eq!(state.count, 2);
        assert!(state.visible);
        assert!(state.all_text.is_empty());

        let state: ElementState = serde_json::from_str(
            r#"{"count":2,"text":"Home","all_text":"Home Shopping Cart","visible":true}"#,
        )
        .unwrap();
        assert_eq!(state.all_text, "Home Shopping Cart");
    }
}
