//! Mock page for testing without a browser.
//!
//! [`MockPage`] is a scripted, in-memory stand-in for the transliteration
//! app. Elements are registered with the selectors that should find them,
//! typed text is "transliterated" after a configurable delay, and the output
//! shows up in one of the layouts the real app has used:
//!
//! - a dedicated output element,
//! - the input element itself after a language tab is clicked,
//! - loose text somewhere in the page body.

use crate::driver::{ElementRef, PageDriver, PageSource};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// PNG signature returned as mock screenshot bytes
pub const MOCK_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

type Transliteration = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Toy transliteration: ASCII letters map onto Sinhala vowels/consonants,
/// everything else passes through, blank input gives blank output
#[must_use]
pub fn toy_transliteration(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                let offset = u32::from(c.to_ascii_lowercase()) - u32::from('a');
                char::from_u32(0x0D85 + offset).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
struct MockElement {
    key: String,
    tag: String,
    selectors: Vec<Selector>,
    visible: bool,
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputMode {
    None,
    Dedicated { key: String },
    Toggle { input_key: String, toggle_key: String },
    Body,
}

struct MockState {
    url: Option<String>,
    navigation_error: Option<String>,
    elements: Vec<MockElement>,
    body_lines: Vec<String>,
    transliterate: Transliteration,
    output_delay: Duration,
    output_mode: OutputMode,
    last_input: Option<(String, Instant)>,
    toggle_active: bool,
    crash_on_type: bool,
    crashed: bool,
    screenshot_error: bool,
    history: Vec<String>,
}

impl std::fmt::Debug for MockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockState")
            .field("url", &self.url)
            .field("elements", &self.elements)
            .field("output_mode", &self.output_mode)
            .field("crashed", &self.crashed)
            .finish_non_exhaustive()
    }
}

impl MockState {
    fn element(&self, key: &str) -> ProbeResult<&MockElement> {
        self.elements
            .iter()
            .find(|e| e.key == key)
            .ok_or_else(|| ProbeError::ElementDetached {
                key: key.to_string(),
            })
    }

    fn ensure_alive(&self) -> ProbeResult<()> {
        if self.crashed {
            Err(ProbeError::page("target crashed"))
        } else {
            Ok(())
        }
    }

    /// Transliterated text once the last input event is older than the delay
    fn ready_output(&self) -> Option<String> {
        let (key, at) = self.last_input.as_ref()?;
        if at.elapsed() < self.output_delay {
            return None;
        }
        let input = self.element(key).ok()?;
        Some((self.transliterate)(&input.value))
    }

    fn displayed(&self, element: &MockElement) -> String {
        match &self.output_mode {
            OutputMode::Dedicated { key } if *key == element.key => {
                self.ready_output().unwrap_or_default()
            }
            OutputMode::Toggle { input_key, .. }
                if *input_key == element.key && self.toggle_active =>
            {
                self.ready_output().unwrap_or_else(|| element.value.clone())
            }
            _ => element.value.clone(),
        }
    }
}

/// Scripted page implementing [`PageDriver`]
#[derive(Debug)]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                url: None,
                navigation_error: None,
                elements: Vec::new(),
                body_lines: Vec::new(),
                transliterate: Arc::new(toy_transliteration),
                output_delay: Duration::ZERO,
                output_mode: OutputMode::None,
                last_input: None,
                toggle_active: false,
                crash_on_type: false,
                crashed: false,
                screenshot_error: false,
                history: Vec::new(),
            }),
        }
    }

    /// Labelled input text area plus a second text area for output
    #[must_use]
    pub fn dedicated_layout() -> Self {
        Self::new()
            .with_element(
                "input",
                "textarea",
                &[
                    Selector::role("textbox", "Input Your Singlish Text Here"),
                    Selector::css("textarea"),
                ],
            )
            .with_element("output", "textarea", &[Selector::css("textarea")])
            .with_dedicated_output("output")
    }

    /// One text area that shows output after the "Sinhala" tab is clicked
    #[must_use]
    pub fn toggle_layout() -> Self {
        Self::new()
            .with_element("input", "textarea", &[Selector::css("textarea")])
            .with_element("tab", "button", &[Selector::role("tab", "Sinhala")])
            .with_language_toggle("input", "tab")
    }

    /// Placeholder-matched input with output rendered as loose body text
    #[must_use]
    pub fn body_layout() -> Self {
        Self::new()
            .with_element(
                "input",
                "textarea",
                &[Selector::placeholder("singlish|input")],
            )
            .with_body_line("SwiftTranslator")
            .with_body_line("සිංහල")
            .with_body_output()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn edit(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.lock());
        self
    }

    fn push_element(self, key: &str, tag: &str, selectors: &[Selector], visible: bool) -> Self {
        self.edit(|s| {
            s.elements.push(MockElement {
                key: key.to_string(),
                tag: tag.to_string(),
                selectors: selectors.to_vec(),
                visible,
                value: String::new(),
            });
        })
    }

    /// Add a visible element found by `selectors`
    #[must_use]
    pub fn with_element(self, key: &str, tag: &str, selectors: &[Selector]) -> Self {
        self.push_element(key, tag, selectors, true)
    }

    /// Add an invisible element found by `selectors`
    #[must_use]
    pub fn with_hidden_element(self, key: &str, tag: &str, selectors: &[Selector]) -> Self {
        self.push_element(key, tag, selectors, false)
    }

    /// Show output in the element `key`
    #[must_use]
    pub fn with_dedicated_output(self, key: &str) -> Self {
        let key = key.to_string();
        self.edit(|s| s.output_mode = OutputMode::Dedicated { key })
    }

    /// Show output in `input_key` once `toggle_key` was clicked
    #[must_use]
    pub fn with_language_toggle(self, input_key: &str, toggle_key: &str) -> Self {
        let (input_key, toggle_key) = (input_key.to_string(), toggle_key.to_string());
        self.edit(|s| {
            s.output_mode = OutputMode::Toggle {
                input_key,
                toggle_key,
            };
        })
    }

    /// Show output as a loose line of body text
    #[must_use]
    pub fn with_body_output(self) -> Self {
        self.edit(|s| s.output_mode = OutputMode::Body)
    }

    /// Never show output anywhere
    #[must_use]
    pub fn without_output(self) -> Self {
        self.edit(|s| s.output_mode = OutputMode::None)
    }

    /// Add static body text
    #[must_use]
    pub fn with_body_line(self, line: &str) -> Self {
        let line = line.to_string();
        self.edit(|s| s.body_lines.push(line))
    }

    /// Delay between the last input event and output appearing
    #[must_use]
    pub fn with_output_delay(self, delay: Duration) -> Self {
        self.edit(|s| s.output_delay = delay)
    }

    /// Replace the transliteration function
    #[must_use]
    pub fn with_transliteration(
        self,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.edit(|s| s.transliterate = Arc::new(f))
    }

    /// Make navigation fail with `message`
    #[must_use]
    pub fn with_navigation_error(self, message: &str) -> Self {
        let message = message.to_string();
        self.edit(|s| s.navigation_error = Some(message))
    }

    /// Crash the page as soon as text is typed
    #[must_use]
    pub fn crashing_on_type(self) -> Self {
        self.edit(|s| s.crash_on_type = true)
    }

    /// Make every screenshot fail
    #[must_use]
    pub fn with_failing_screenshots(self) -> Self {
        self.edit(|s| s.screenshot_error = true)
    }

    /// URL of the last successful navigation
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.lock().url.clone()
    }

    /// Recorded calls, in order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a call starting with `prefix` was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Raw value of an element, bypassing output rendering
    #[must_use]
    pub fn raw_value(&self, key: &str) -> Option<String> {
        self.lock().element(key).ok().map(|e| e.value.clone())
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str, wait_until: LoadState, _timeout: Duration) -> ProbeResult<()> {
        let mut s = self.lock();
        s.history.push(format!("goto:{url}:{wait_until}"));
        if let Some(message) = s.navigation_error.clone() {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                message,
            });
        }
        s.url = Some(url.to_string());
        Ok(())
    }

    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementRef>> {
        let s = self.lock();
        s.ensure_alive()?;
        Ok(s.elements
            .iter()
            .filter(|e| e.selectors.contains(selector))
            .map(|e| ElementRef::new(&e.key, &e.tag, e.visible))
            .collect())
    }

    async fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
        let mut s = self.lock();
        s.ensure_alive()?;
        s.element(&element.key)?;
        s.history.push(format!("clear:{}", element.key));
        if let Some(e) = s.elements.iter_mut().find(|e| e.key == element.key) {
            e.value.clear();
        }
        s.last_input = Some((element.key.clone(), Instant::now()));
        Ok(())
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
        let mut s = self.lock();
        s.ensure_alive()?;
        s.element(&element.key)?;
        s.history.push(format!("type:{}:{text}", element.key));
        if let Some(e) = s.elements.iter_mut().find(|e| e.key == element.key) {
            e.value.push_str(text);
        }
        s.last_input = Some((element.key.clone(), Instant::now()));
        if s.crash_on_type {
            s.crashed = true;
        }
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> ProbeResult<()> {
        let mut s = self.lock();
        s.ensure_alive()?;
        s.element(&element.key)?;
        s.history.push(format!("click:{}", element.key));
        if matches!(&s.output_mode, OutputMode::Toggle { toggle_key, .. } if *toggle_key == element.key)
        {
            s.toggle_active = true;
        }
        Ok(())
    }

    async fn read_value(&self, element: &ElementRef) -> ProbeResult<String> {
        let s = self.lock();
        s.ensure_alive()?;
        let e = s.element(&element.key)?;
        Ok(s.displayed(e))
    }

    async fn body_text(&self) -> ProbeResult<String> {
        let s = self.lock();
        s.ensure_alive()?;
        let mut lines = s.body_lines.clone();
        lines.extend(
            s.elements
                .iter()
                .filter(|e| e.visible)
                .map(|e| s.displayed(e)),
        );
        if s.output_mode == OutputMode::Body {
            if let Some(out) = s.ready_output() {
                lines.push(out);
            }
        }
        Ok(lines.join("\n"))
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let mut s = self.lock();
        s.history.push("screenshot".to_string());
        if s.screenshot_error {
            return Err(ProbeError::Screenshot {
                message: "mock capture failure".to_string(),
            });
        }
        Ok(MOCK_PNG.to_vec())
    }

    async fn is_alive(&self) -> bool {
        !self.lock().crashed
    }
}

/// [`PageSource`] handing out a fresh [`MockPage`] per case
pub struct MockPageSource {
    factory: Box<dyn FnMut(usize) -> MockPage + Send>,
    acquired: usize,
    released: usize,
    fail_acquire: bool,
}

impl std::fmt::Debug for MockPageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPageSource")
            .field("acquired", &self.acquired)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl MockPageSource {
    /// Build pages with `factory`, which receives the 0-based acquisition count
    #[must_use]
    pub fn new(factory: impl FnMut(usize) -> MockPage + Send + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            acquired: 0,
            released: 0,
            fail_acquire: false,
        }
    }

    /// Make every acquisition fail
    #[must_use]
    pub const fn failing(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    /// Pages handed out so far
    #[must_use]
    pub const fn acquired(&self) -> usize {
        self.acquired
    }

    /// Pages returned so far
    #[must_use]
    pub const fn released(&self) -> usize {
        self.released
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    type Page = MockPage;

    async fn acquire(&mut self) -> ProbeResult<MockPage> {
        if self.fail_acquire {
            return Err(ProbeError::page("could not open a new page"));
        }
        let page = (self.factory)(self.acquired);
        self.acquired += 1;
        Ok(page)
    }

    async fn release(&mut self, _page: MockPage) -> ProbeResult<()> {
        self.released += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::contains_sinhala;

    #[test]
    fn test_toy_transliteration() {
        assert!(contains_sinhala(&toy_transliteration("mama gedara yanawaa")));
        assert_eq!(toy_transliteration("@@@###$$$"), "@@@###$$$");
        assert_eq!(toy_transliteration("   "), "");
    }

    #[tokio::test]
    async fn test_dedicated_output_after_typing() {
        let page = MockPage::dedicated_layout();
        let input = ElementRef::new("input", "textarea", true);
        let output = ElementRef::new("output", "textarea", true);
        assert_eq!(page.read_value(&output).await.unwrap(), "");
        page.type_text(&input, "mama").await.unwrap();
        assert!(contains_sinhala(&page.read_value(&output).await.unwrap()));
        assert_eq!(page.read_value(&input).await.unwrap(), "mama");
    }

    #[tokio::test]
    async fn test_toggle_switches_input_display() {
        let page = MockPage::toggle_layout();
        let input = ElementRef::new("input", "textarea", true);
        page.type_text(&input, "mama").await.unwrap();
        assert_eq!(page.read_value(&input).await.unwrap(), "mama");
        page.click(&ElementRef::new("tab", "button", true)).await.unwrap();
        assert!(contains_sinhala(&page.read_value(&input).await.unwrap()));
    }

    #[tokio::test]
    async fn test_output_delay() {
        let page = MockPage::body_layout().with_output_delay(Duration::from_secs(60));
        let input = ElementRef::new("input", "textarea", true);
        page.type_text(&input, "mama").await.unwrap();
        let body = page.body_text().await.unwrap();
        assert!(body.contains("mama"));
        assert!(!body.contains(&toy_transliteration("mama")));
    }

    #[tokio::test]
    async fn test_crash_on_type() {
        let page = MockPage::dedicated_layout().crashing_on_type();
        let input = ElementRef::new("input", "textarea", true);
        assert!(page.is_alive().await);
        page.type_text(&input, "@@@").await.unwrap();
        assert!(!page.is_alive().await);
        assert!(page.body_text().await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_element_is_detached() {
        let page = MockPage::new();
        let err = page
            .read_value(&ElementRef::new("ghost", "div", true))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::ElementDetached { .. }));
    }

    #[tokio::test]
    async fn test_source_counts_pages() {
        let mut source = MockPageSource::new(|_| MockPage::new());
        let page = source.acquire().await.unwrap();
        source.release(page).await.unwrap();
        assert_eq!(source.acquired(), 1);
        assert_eq!(source.released(), 1);
        assert!(MockPageSource::new(|_| MockPage::new())
            .failing()
            .acquire()
            .await
            .is_err());
    }
}
