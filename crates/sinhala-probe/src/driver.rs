//! PageDriver - the browser automation capability interface.
//!
//! The scenario runner composes these primitives and nothing else, so any
//! automation backend that can provide them can run the suite.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (capability trait)                               │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────┐   ┌──────────────────────────┐  │
//! │  │  ChromiumPage           │   │  MockPage                │  │
//! │  │  (feature = "browser")  │   │  (unit/integration tests)│  │
//! │  │  CDP via chromiumoxide  │   │  scripted in-memory DOM  │  │
//! │  └─────────────────────────┘   └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::Selector;
use crate::result::ProbeResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handle to an element of the current document.
///
/// `key` is stamped on the element when it is first queried and stays valid
/// until the page navigates away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Stable per-document key
    pub key: String,
    /// Lower-cased tag name
    pub tag: String,
    /// Whether the element was visible when queried
    pub visible: bool,
}

impl ElementRef {
    /// Create a new element handle
    #[must_use]
    pub fn new(key: impl Into<String>, tag: impl Into<String>, visible: bool) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            visible,
        }
    }

    /// Whether two handles point at the same element
    #[must_use]
    pub fn same_element(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// Browser page capabilities used by the scenario runner
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for `wait_until`, bounded by `timeout`
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// All elements matching `selector`, in document order
    async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementRef>>;

    /// Remove existing content from an editable element the way a user would
    async fn clear(&self, element: &ElementRef) -> ProbeResult<()>;

    /// Type text with real key events
    async fn type_text(&self, element: &ElementRef, text: &str) -> ProbeResult<()>;

    /// Type one character at a time, pausing `delay` after each key
    async fn type_text_with_delay(
        &self,
        element: &ElementRef,
        text: &str,
        delay: Duration,
    ) -> ProbeResult<()> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.type_text(element, ch.encode_utf8(&mut buf)).await?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Click an element
    async fn click(&self, element: &ElementRef) -> ProbeResult<()>;

    /// Form value for inputs and text areas, rendered text otherwise
    async fn read_value(&self, element: &ElementRef) -> ProbeResult<String>;

    /// Rendered text of the whole page
    async fn body_text(&self) -> ProbeResult<String>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Whether the page still responds to script evaluation
    async fn is_alive(&self) -> bool;
}

/// Supplier of pages: one page per case, released afterwards
#[async_trait]
pub trait PageSource: Send {
    /// Page type handed out
    type Page: PageDriver;

    /// Open a page for the next case
    async fn acquire(&mut self) -> ProbeResult<Self::Page>;

    /// Dispose of a page after its case finished
    async fn release(&mut self, page: Self::Page) -> ProbeResult<()>;
}
