//! Locator abstraction for element selection.
//!
//! The target application has rendered its input and output surfaces in
//! different ways across revisions, so nothing is located through a single
//! selector. A surface is described by an ordered list of [`Locator`]s and
//! resolved with a first-success-wins fold ([`resolve_first`]), optionally
//! retried until a deadline ([`resolve_within`]).
//!
//! # Strategy chain
//!
//! ```text
//!  role=textbox[name~"Input Your Singlish"] ──► none
//!  placeholder~/singlish|input/i            ──► none
//!  css=textarea (first visible)             ──► <textarea data-probe-key="p3">  ✓
//!  css=input, [contenteditable]             ──► (not consulted)
//! ```

use crate::driver::{ElementRef, PageDriver};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, WaitOptions, WaitOutcome};
use serde::{Deserialize, Serialize};

/// Default bound for resolving an input surface (15 seconds)
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 15_000;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "kebab-case")]
pub enum Selector {
    /// Accessible role with an optional accessible-name substring (case-insensitive)
    Role {
        /// ARIA role (`textbox`, `button`, `tab`, ...)
        role: String,
        /// Accessible name fragment; empty matches any name
        #[serde(default)]
        name: String,
    },
    /// Placeholder attribute matched against a case-insensitive regular expression
    Placeholder {
        /// Regular expression source
        pattern: String,
    },
    /// Innermost elements whose rendered text matches
    Text {
        /// Text to match
        text: String,
        /// Whole-text match instead of substring
        #[serde(default)]
        exact: bool,
    },
    /// CSS selector
    Css {
        /// Selector source
        css: String,
    },
}

/// Implicit role mappings for roles the runner asks about
const ROLE_IMPLICIT_CSS: &[(&str, &str)] = &[
    (
        "textbox",
        "textarea, input:not([type]), input[type=text], input[type=search], [contenteditable=''], [contenteditable=true]",
    ),
    ("button", "button, input[type=button], input[type=submit]"),
    ("tab", "[role=tab]"),
];

/// Embed a string as a JavaScript literal
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

impl Selector {
    /// Create a role selector
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(pattern: impl Into<String>) -> Self {
        Self::Placeholder {
            pattern: pattern.into(),
        }
    }

    /// Create a substring text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Create a whole-text selector
    #[must_use]
    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: true,
        }
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self::Css { css: css.into() }
    }

    /// Check the selector can be sent to a page
    ///
    /// # Errors
    ///
    /// Returns a configuration error for blank selectors and placeholder
    /// patterns that are not valid regular expressions.
    pub fn validate(&self) -> ProbeResult<()> {
        match self {
            Self::Role { role, .. } if role.trim().is_empty() => {
                Err(ProbeError::config("role selector with empty role"))
            }
            Self::Placeholder { pattern } => regex::Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| ProbeError::config(format!("placeholder pattern {pattern:?}: {e}"))),
            Self::Text { text, .. } if text.trim().is_empty() => {
                Err(ProbeError::config("text selector with empty text"))
            }
            Self::Css { css } if css.trim().is_empty() => {
                Err(ProbeError::config("empty css selector"))
            }
            _ => Ok(()),
        }
    }

    /// JavaScript expression evaluating to the array of matching elements, in document order
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css { css } => format!("Array.from(document.querySelectorAll({}))", js_str(css)),
            Self::Placeholder { pattern } => format!(
                "Array.from(document.querySelectorAll('[placeholder]')).filter(el => new RegExp({}, 'i').test(el.getAttribute('placeholder') || ''))",
                js_str(pattern)
            ),
            Self::Text { text, exact } => {
                let test = if *exact {
                    "t === want"
                } else {
                    "t.includes(want)"
                };
                format!(
                    "((want) => {{ \
                        const norm = s => (s || '').replace(/\\s+/g, ' ').trim(); \
                        const hit = el => {{ const t = norm(el.innerText); return {test}; }}; \
                        return Array.from(document.querySelectorAll('body *')) \
                            .filter(el => hit(el) && !Array.from(el.children).some(hit)); \
                    }})({})",
                    js_str(text.trim())
                )
            }
            Self::Role { role, name } => {
                let implicit = ROLE_IMPLICIT_CSS
                    .iter()
                    .find(|(r, _)| r == role)
                    .map_or(String::new(), |(_, css)| format!(", {css}"));
                let css = format!("[role={}]{implicit}", js_str(role));
                format!(
                    "((name) => {{ \
                        const norm = s => (s || '').replace(/\\s+/g, ' ').trim().toLowerCase(); \
                        const label = el => {{ \
                            const by = el.getAttribute('aria-labelledby'); \
                            if (by) return by.split(/\\s+/).map(id => (document.getElementById(id) || {{}}).textContent || '').join(' '); \
                            if (el.getAttribute('aria-label')) return el.getAttribute('aria-label'); \
                            if (el.labels && el.labels.length) return Array.from(el.labels).map(l => l.textContent).join(' '); \
                            if (el.getAttribute('placeholder')) return el.getAttribute('placeholder'); \
                            return el.getAttribute('title') || el.innerText || ''; \
                        }}; \
                        return Array.from(document.querySelectorAll({})) \
                            .filter(el => !name || norm(label(el)).includes(norm(name))); \
                    }})({})",
                    js_str(&css),
                    js_str(name)
                )
            }
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role { role, name } if name.is_empty() => write!(f, "role={role}"),
            Self::Role { role, name } => write!(f, "role={role}[name~{name:?}]"),
            Self::Placeholder { pattern } => write!(f, "placeholder~/{pattern}/i"),
            Self::Text { text, exact: true } => write!(f, "text={text:?}"),
            Self::Text { text, exact: false } => write!(f, "text~{text:?}"),
            Self::Css { css } => write!(f, "css={css}"),
        }
    }
}

/// Which visible match a locator picks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Nth {
    /// First visible match
    #[default]
    First,
    /// Visible match at this index
    Index(usize),
    /// Last visible match
    Last,
}

impl Nth {
    /// Pick from the visible matches
    #[must_use]
    pub fn pick<'a>(&self, visible: &[&'a ElementRef]) -> Option<&'a ElementRef> {
        match self {
            Self::First => visible.first().copied(),
            Self::Index(i) => visible.get(*i).copied(),
            Self::Last => visible.last().copied(),
        }
    }
}

/// A single resolution strategy: a selector plus which visible match to take
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// How to find candidates
    pub selector: Selector,
    /// Which visible candidate to take
    #[serde(default)]
    pub nth: Nth,
}

impl Locator {
    /// Locator taking the first visible match
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            nth: Nth::First,
        }
    }

    /// Take the visible match at `index`
    #[must_use]
    pub const fn nth(mut self, index: usize) -> Self {
        self.nth = Nth::Index(index);
        self
    }

    /// Take the last visible match
    #[must_use]
    pub const fn last(mut self) -> Self {
        self.nth = Nth::Last;
        self
    }

    /// Run this strategy once against a page
    ///
    /// # Errors
    ///
    /// Propagates page query errors.
    pub async fn locate<P: PageDriver + ?Sized>(&self, page: &P) -> ProbeResult<Option<ElementRef>> {
        let matches = page.query(&self.selector).await?;
        let visible: Vec<&ElementRef> = matches.iter().filter(|e| e.visible).collect();
        Ok(self.nth.pick(&visible).cloned())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.nth {
            Nth::First => write!(f, "{}", self.selector),
            Nth::Index(i) => write!(f, "{} >> nth={i}", self.selector),
            Nth::Last => write!(f, "{} >> last", self.selector),
        }
    }
}

/// An element found by one strategy of a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The element
    pub element: ElementRef,
    /// Index of the strategy that found it
    pub strategy: usize,
}

/// Try each locator in order; the first one yielding a visible element wins.
///
/// A strategy whose query fails is logged and skipped, so one broken selector
/// cannot hide a working one further down the chain.
///
/// # Errors
///
/// Returns the last query error only when every strategy failed to query.
pub async fn resolve_first<P: PageDriver + ?Sized>(
    page: &P,
    strategies: &[Locator],
) -> ProbeResult<Option<Resolved>> {
    resolve_first_where(page, strategies, |_| true).await
}

/// Like [`resolve_first`], but a strategy only wins if `accept` approves its
/// element; rejected matches fall through to the next strategy.
///
/// # Errors
///
/// Returns the last query error only when every strategy failed to query.
pub async fn resolve_first_where<P, F>(
    page: &P,
    strategies: &[Locator],
    accept: F,
) -> ProbeResult<Option<Resolved>>
where
    P: PageDriver + ?Sized,
    F: Fn(&ElementRef) -> bool + Send + Sync,
{
    let mut last_error = None;
    let mut queried = false;
    for (strategy, locator) in strategies.iter().enumerate() {
        match locator.locate(page).await {
            Ok(Some(element)) if accept(&element) => {
                tracing::debug!(%locator, key = %element.key, "strategy matched");
                return Ok(Some(Resolved { element, strategy }));
            }
            Ok(Some(element)) => {
                tracing::debug!(%locator, key = %element.key, "strategy match rejected");
                queried = true;
            }
            Ok(None) => queried = true,
            Err(e) => {
                tracing::debug!(%locator, error = %e, "strategy query failed");
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if !queried => Err(e),
        _ => Ok(None),
    }
}

/// Repeat [`resolve_first`] until a strategy matches or the wait runs out
pub async fn resolve_within<P: PageDriver + ?Sized>(
    page: &P,
    strategies: &[Locator],
    options: &WaitOptions,
) -> Option<Resolved> {
    let outcome = poll_until(
        options,
        || resolve_first(page, strategies),
        Option::is_some,
    )
    .await;
    match outcome {
        WaitOutcome::Met { value, .. } => value,
        WaitOutcome::TimedOut { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_page::MockPage;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let query = Selector::css("textarea").to_query_all();
            assert!(query.contains("querySelectorAll(\"textarea\")"));
        }

        #[test]
        fn test_placeholder_query_is_case_insensitive_regex() {
            let query = Selector::placeholder("singlish|input").to_query_all();
            assert!(query.contains("new RegExp(\"singlish|input\", 'i')"));
        }

        #[test]
        fn test_role_query_includes_implicit_textbox_elements() {
            let query = Selector::role("textbox", "Input Your Singlish Text Here.").to_query_all();
            assert!(query.contains("[role=\\\"textbox\\\"], textarea"));
            assert!(query.contains("aria-label"));
            assert!(query.contains("\"Input Your Singlish Text Here.\""));
        }

        #[test]
        fn test_role_without_implicit_mapping() {
            let query = Selector::role("dialog", "").to_query_all();
            assert!(query.contains("[role=\\\"dialog\\\"]\""));
        }

        #[test]
        fn test_text_query_exact_vs_substring() {
            assert!(Selector::exact_text("Sinhala").to_query_all().contains("t === want"));
            assert!(Selector::text("Sinhala").to_query_all().contains("t.includes(want)"));
        }

        #[test]
        fn test_strings_are_json_escaped() {
            let query = Selector::css("a[title=\"x\"]").to_query_all();
            assert!(query.contains(r#""a[title=\"x\"]""#));
        }

        #[test]
        fn test_validate() {
            assert!(Selector::placeholder("singlish|input").validate().is_ok());
            assert!(Selector::placeholder("(unclosed").validate().is_err());
            assert!(Selector::css("  ").validate().is_err());
            assert!(Selector::role("", "x").validate().is_err());
            assert!(Selector::exact_text("").validate().is_err());
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("textarea").to_string(), "css=textarea");
            assert_eq!(
                Locator::new(Selector::exact_text("Sinhala")).nth(1).to_string(),
                "text=\"Sinhala\" >> nth=1"
            );
        }

        #[test]
        fn test_selector_yaml_shape() {
            let yaml = "by: role\nrole: tab\nname: Sinhala\n";
            let selector: Selector = serde_yaml_ng::from_str(yaml).unwrap();
            assert_eq!(selector, Selector::role("tab", "Sinhala"));
        }
    }

    mod nth_tests {
        use super::*;

        fn refs() -> Vec<ElementRef> {
            (0..3).map(|i| ElementRef::new(format!("p{i}"), "div", true)).collect()
        }

        #[test]
        fn test_pick() {
            let all = refs();
            let visible: Vec<&ElementRef> = all.iter().collect();
            assert_eq!(Nth::First.pick(&visible).unwrap().key, "p0");
            assert_eq!(Nth::Index(1).pick(&visible).unwrap().key, "p1");
            assert_eq!(Nth::Last.pick(&visible).unwrap().key, "p2");
            assert!(Nth::Index(5).pick(&visible).is_none());
            assert!(Nth::First.pick(&[]).is_none());
        }
    }

    mod resolve_tests {
        use super::*;

        #[tokio::test]
        async fn test_first_success_wins() {
            let page = MockPage::new()
                .with_element("in", "textarea", &[Selector::css("textarea")])
                .with_element(
                    "labelled",
                    "textarea",
                    &[Selector::role("textbox", "Input Your Singlish Text Here.")],
                );
            let chain = [
                Locator::new(Selector::placeholder("singlish")),
                Locator::new(Selector::role("textbox", "Input Your Singlish Text Here.")),
                Locator::new(Selector::css("textarea")),
            ];
            let resolved = resolve_first(&page, &chain).await.unwrap().unwrap();
            assert_eq!(resolved.strategy, 1);
            assert_eq!(resolved.element.key, "labelled");
        }

        #[tokio::test]
        async fn test_hidden_elements_are_skipped() {
            let page = MockPage::new()
                .with_hidden_element("hidden", "textarea", &[Selector::css("textarea")])
                .with_element("shown", "textarea", &[Selector::css("textarea")]);
            let chain = [Locator::new(Selector::css("textarea"))];
            let resolved = resolve_first(&page, &chain).await.unwrap().unwrap();
            assert_eq!(resolved.element.key, "shown");
        }

        #[tokio::test]
        async fn test_rejected_match_falls_through() {
            let page = MockPage::new()
                .with_element("in", "textarea", &[Selector::css("textarea")])
                .with_element("out", "div", &[Selector::css("#output")]);
            let chain = [
                Locator::new(Selector::css("textarea")),
                Locator::new(Selector::css("#output")),
            ];
            let resolved = resolve_first_where(&page, &chain, |e| e.key != "in")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(resolved.strategy, 1);
            assert_eq!(resolved.element.key, "out");
        }

        #[tokio::test]
        async fn test_all_queries_failing_is_an_error() {
            let page = MockPage::new()
                .with_element("in", "textarea", &[Selector::css("textarea")])
                .crashing_on_type();
            page.type_text(&ElementRef::new("in", "textarea", true), "x")
                .await
                .unwrap();
            let chain = [Locator::new(Selector::css("textarea"))];
            assert!(resolve_first(&page, &chain).await.is_err());
        }

        #[tokio::test]
        async fn test_nothing_matches() {
            let page = MockPage::new();
            let chain = [Locator::new(Selector::css("textarea"))];
            assert!(resolve_first(&page, &chain).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_resolve_within_gives_up() {
            let page = MockPage::new();
            let chain = [Locator::new(Selector::css("textarea"))];
            let options = WaitOptions::new().with_timeout(30).with_poll_interval(5);
            assert!(resolve_within(&page, &chain, &options).await.is_none());
        }
    }
}
