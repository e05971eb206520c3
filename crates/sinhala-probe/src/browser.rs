//! Browser control over the Chrome DevTools Protocol.
//!
//! With the `browser` feature this module launches Chromium through
//! chromiumoxide and implements [`PageDriver`](crate::driver::PageDriver) for
//! its pages. Elements are tracked by a `data-probe-key` attribute stamped on
//! them the first time a selector query returns them, so an
//! [`ElementRef`](crate::driver::ElementRef) stays valid until the document
//! is replaced.
//!
//! Without the feature only [`BrowserConfig`] is available; tests drive
//! [`MockPage`](crate::mock_page::MockPage) instead.

use crate::config::SuiteConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run without a window
    pub headless: bool,
    /// Keep the Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Window width
    pub viewport_width: u32,
    /// Window height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Bound for each DevTools command
    pub request_timeout: Duration,
    /// Sampling interval for readiness polling
    pub poll_interval: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::from_suite(&SuiteConfig::default())
    }
}

impl BrowserConfig {
    /// Launch settings for a suite run
    #[must_use]
    pub fn from_suite(config: &SuiteConfig) -> Self {
        Self {
            headless: config.headless,
            sandbox: config.sandbox,
            viewport_width: config.viewport.width,
            viewport_height: config.viewport.height,
            chromium_path: config.chromium_path.clone(),
            request_timeout: config.action_timeout(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
/// Script stamping probe keys on `elements` and describing each one
fn describe_elements(query_all: &str) -> String {
    format!(
        "(() => {{ \
            const els = {query_all}; \
            window.__probeSeq = window.__probeSeq || 0; \
            return els.map(el => {{ \
                if (!el.getAttribute('data-probe-key')) el.setAttribute('data-probe-key', 'p' + (++window.__probeSeq)); \
                const r = el.getBoundingClientRect(); \
                const s = window.getComputedStyle(el); \
                const visible = r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; \
                return {{ key: el.getAttribute('data-probe-key'), tag: el.tagName.toLowerCase(), visible }}; \
            }}); \
        }})()"
    )
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
/// CSS selector addressing a stamped element
fn key_selector(key: &str) -> String {
    format!("[data-probe-key=\"{}\"]", key.replace('"', "\\\""))
}

#[cfg(feature = "browser")]
#[allow(clippy::wildcard_imports, clippy::missing_errors_doc)]
mod cdp {
    use super::*;
    use crate::driver::{ElementRef, PageDriver, PageSource};
    use crate::locator::Selector;
    use crate::result::{ProbeError, ProbeResult};
    use crate::wait::{poll_until, LoadState, WaitOptions};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams, NavigateParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;

    fn page_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::page(e.to_string())
    }

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: CdpBrowser,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance with real CDP
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(None)
                .request_timeout(config.request_timeout);

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
                .map_err(|message| ProbeError::BrowserLaunch { message })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| ProbeError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!(error = %e, "devtools handler stopped");
                        break;
                    }
                }
            });

            tracing::info!(
                headless = config.headless,
                sandbox = config.sandbox,
                "browser launched"
            );
            Ok(Self {
                config,
                inner: browser,
                handle,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn new_page(&self) -> ProbeResult<ChromiumPage> {
            let page = self
                .inner
                .new_page("about:blank")
                .await
                .map_err(page_error)?;
            Ok(ChromiumPage {
                inner: page,
                poll_interval: self.config.poll_interval,
            })
        }

        /// Close the browser
        pub async fn close(mut self) -> ProbeResult<()> {
            self.inner
                .close()
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            if let Err(e) = self.inner.wait().await {
                tracing::debug!(error = %e, "browser process did not exit cleanly");
            }
            self.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl PageSource for Browser {
        type Page = ChromiumPage;

        async fn acquire(&mut self) -> ProbeResult<ChromiumPage> {
            self.new_page().await
        }

        async fn release(&mut self, page: ChromiumPage) -> ProbeResult<()> {
            page.inner.close().await.map_err(page_error)
        }
    }

    /// A browser tab with real CDP connection
    #[derive(Debug)]
    pub struct ChromiumPage {
        inner: CdpPage,
        poll_interval: Duration,
    }

    impl ChromiumPage {
        async fn eval<T: DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
            self.inner
                .evaluate(script)
                .await
                .map_err(page_error)?
                .into_value()
                .map_err(page_error)
        }

        async fn element(&self, element: &ElementRef) -> ProbeResult<chromiumoxide::Element> {
            self.inner
                .find_element(key_selector(&element.key))
                .await
                .map_err(|_| ProbeError::ElementDetached {
                    key: element.key.clone(),
                })
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumPage {
        async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
            let nav_error = |message: String| ProbeError::Navigation {
                url: url.to_string(),
                message,
            };

            // Marks the old document so readiness is only read from the new one
            if let Err(e) = self.eval::<bool>("window.__probeStale = true".to_string()).await {
                tracing::debug!(error = %e, "could not mark current document");
            }

            let response = tokio::time::timeout(timeout, self.inner.execute(NavigateParams::new(url)))
                .await
                .map_err(|_| nav_error(format!("no response within {}ms", timeout.as_millis())))?
                .map_err(|e| nav_error(e.to_string()))?;
            if let Some(error_text) = response.result.error_text.clone() {
                return Err(nav_error(error_text));
            }

            let states = serde_json::to_string(wait_until.ready_states())?;
            let script = format!("!window.__probeStale && {states}.includes(document.readyState)");
            let options = WaitOptions::from_millis(
                timeout.as_millis() as u64,
                self.poll_interval.as_millis() as u64,
            );
            let ready = poll_until(&options, || self.eval::<bool>(script.clone()), |ok| *ok).await;
            if ready.is_met() {
                tracing::debug!(url, state = %wait_until, "navigation complete");
                Ok(())
            } else {
                Err(nav_error(format!(
                    "{wait_until} not reached within {}ms",
                    timeout.as_millis()
                )))
            }
        }

        async fn query(&self, selector: &Selector) -> ProbeResult<Vec<ElementRef>> {
            self.eval(describe_elements(&selector.to_query_all())).await
        }

        async fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
            let handle = self.element(element).await?;
            handle.focus().await.map_err(|e| ProbeError::input(e.to_string()))?;
            let select = format!(
                "(() => {{ const el = document.querySelector({}); if (!el) return false; \
                 if (typeof el.select === 'function') {{ el.select(); }} \
                 else {{ window.getSelection().selectAllChildren(el); }} return true; }})()",
                serde_json::to_string(&key_selector(&element.key))?
            );
            if !self.eval::<bool>(select).await? {
                return Err(ProbeError::ElementDetached {
                    key: element.key.clone(),
                });
            }
            handle
                .press_key("Backspace")
                .await
                .map_err(|e| ProbeError::input(e.to_string()))?;
            Ok(())
        }

        async fn type_text(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
            let handle = self.element(element).await?;
            handle.focus().await.map_err(|e| ProbeError::input(e.to_string()))?;
            handle
                .type_str(text)
                .await
                .map_err(|e| ProbeError::input(e.to_string()))?;
            Ok(())
        }

        async fn click(&self, element: &ElementRef) -> ProbeResult<()> {
            self.element(element)
                .await?
                .click()
                .await
                .map_err(|e| ProbeError::input(e.to_string()))?;
            Ok(())
        }

        async fn read_value(&self, element: &ElementRef) -> ProbeResult<String> {
            let script = format!(
                "(() => {{ const el = document.querySelector({}); if (!el) return null; \
                 const tag = el.tagName; \
                 if (tag === 'TEXTAREA' || tag === 'INPUT') return el.value; \
                 return el.innerText || el.textContent || ''; }})()",
                serde_json::to_string(&key_selector(&element.key))?
            );
            self.eval::<Option<String>>(script)
                .await?
                .ok_or_else(|| ProbeError::ElementDetached {
                    key: element.key.clone(),
                })
        }

        async fn body_text(&self) -> ProbeResult<String> {
            self.eval("document.body ? document.body.innerText : ''".to_string())
                .await
        }

        async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                self.inner
                    .execute(params)
                    .await
                    .map_err(|e| ProbeError::Screenshot {
                        message: e.to_string(),
                    })?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| ProbeError::Screenshot {
                    message: e.to_string(),
                })
        }

        async fn is_alive(&self) -> bool {
            let probe = self.eval::<String>("document.readyState".to_string());
            matches!(
                tokio::time::timeout(Duration::from_secs(5), probe).await,
                Ok(Ok(_))
            )
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, ChromiumPage};
