//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature enabled this drives a real Chromium through
//! chromiumoxide: navigation, form interaction, element probing, response
//! observation, and request interception. Without the feature a mock page
//! stands in so the page-object and detection logic stays unit-testable.

use crate::network::{HttpMethod, MockRouter, ResponseLog};
use crate::result::{TestkitError, TestkitResult};

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            user_agent: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use super::*;
    use crate::locator::Selector;
    use crate::network::{ResponseEvent, RouteDecision};
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::fetch::{
        ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
        FailRequestParams, FulfillRequestParams, HeaderEntry,
    };
    use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Browser instance with a live CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> TestkitResult<Self> {
            let mut builder = CdpConfig::builder();

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            builder = builder.window_size(config.viewport_width, config.viewport_height);

            let cdp_config = builder
                .build()
                .map_err(|e| TestkitError::BrowserLaunchError { message: e })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                TestkitError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Create a new page and start observing its responses
        pub async fn new_page(&self) -> TestkitResult<Page> {
            let browser = self.inner.lock().await;
            let cdp_page =
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| TestkitError::PageError {
                        message: e.to_string(),
                    })?;

            let responses = ResponseLog::new();
            Page::observe_responses(&cdp_page, responses.clone()).await?;

            Ok(Page {
                url: String::from("about:blank"),
                responses,
                inner: cdp_page,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> TestkitResult<()> {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| TestkitError::BrowserLaunchError {
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }

    /// A browser page with a live CDP connection.
    ///
    /// The underlying CDP handle is cheaply cloneable, so interception and
    /// observation tasks run off their own clones and never contend with
    /// in-flight page operations.
    #[derive(Debug)]
    pub struct Page {
        /// Current URL
        url: String,
        responses: ResponseLog,
        inner: CdpPage,
    }

    impl Page {
        async fn observe_responses(page: &CdpPage, log: ResponseLog) -> TestkitResult<()> {
            use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;

            let mut events = page.event_listener::<EventResponseReceived>().await.map_err(
                |e| TestkitError::PageError {
                    message: e.to_string(),
                },
            )?;
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    log.record(ResponseEvent {
                        url: event.response.url.clone(),
                        status: u16::try_from(event.response.status).unwrap_or(0),
                        method: HttpMethod::Any,
                    });
                }
            });
            Ok(())
        }

        /// Install a route table; matched requests are answered locally.
        pub async fn install_router(&self, mut router: MockRouter) -> TestkitResult<()> {
            self.inner
                .execute(FetchEnableParams::default())
                .await
                .map_err(|e| TestkitError::PageError {
                    message: e.to_string(),
                })?;

            let mut paused = self
                .inner
                .event_listener::<EventRequestPaused>()
                .await
                .map_err(|e| TestkitError::PageError {
                    message: e.to_string(),
                })?;

            let page = self.inner.clone();
            tokio::spawn(async move {
                while let Some(event) = paused.next().await {
                    let method = HttpMethod::parse(&event.request.method);
                    let decision = router.resolve(&event.request.url, &method);
                    let request_id = event.request_id.clone();
                    let result = match decision {
                        RouteDecision::Fulfill(response) => {
                            let headers = vec![HeaderEntry {
                                name: "content-type".to_string(),
                                value: response.content_type.clone(),
                            }];
                            let params = FulfillRequestParams::builder()
                                .request_id(request_id)
                                .response_code(i64::from(response.status))
                                .response_headers(headers)
                                .body(chromiumoxide::types::Binary::from(response.body))
                                .build();
                            match params {
                                Ok(params) => page.execute(params).await.map(|_| ()),
                                Err(e) => {
                                    tracing::warn!(error = %e, "mock response rejected by CDP");
                                    continue;
                                }
                            }
                        }
                        RouteDecision::Continue => page
                            .execute(ContinueRequestParams::new(request_id))
                            .await
                            .map(|_| ()),
                        RouteDecision::Block => page
                            .execute(
                                FailRequestParams::new(request_id, ErrorReason::BlockedByClient),
                            )
                            .await
                            .map(|_| ()),
                    };
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "intercepted request could not be resolved");
                    }
                }
            });
            Ok(())
        }

        /// Navigate to a URL
        pub async fn goto(&mut self, url: &str) -> TestkitResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| TestkitError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.inner
                .wait_for_navigation()
                .await
                .map_err(|e| TestkitError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.url = url.to_string();
            Ok(())
        }

        /// Evaluate a JavaScript expression and deserialize its result
        pub async fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> TestkitResult<T> {
            let result = self
                .inner
                .evaluate(expr)
                .await
                .map_err(|e| TestkitError::PageError {
                    message: e.to_string(),
                })?;
            result.into_value().map_err(|e| TestkitError::PageError {
                message: e.to_string(),
            })
        }

        /// Type a value into the element a selector resolves to
        pub async fn fill(&self, selector: &Selector, value: &str) -> TestkitResult<()> {
            let script = format!(
                "(el => {{ if (!el) return false; el.value = {value:?}; \
                 el.dispatchEvent(new Event('input', {{bubbles: true}})); \
                 el.dispatchEvent(new Event('change', {{bubbles: true}})); return true; }})({})",
                selector.to_query()
            );
            let filled: bool = self.eval(&script).await?;
            if filled {
                Ok(())
            } else {
                Err(TestkitError::assertion(format!("no element matches {selector}")))
            }
        }

        /// Click the element a selector resolves to
        pub async fn click(&self, selector: &Selector) -> TestkitResult<()> {
            let script = format!(
                "(el => {{ if (!el) return false; el.click(); return true; }})({})",
                selector.to_query()
            );
            let clicked: bool = self.eval(&script).await?;
            if clicked {
                Ok(())
            } else {
                Err(TestkitError::assertion(format!("no element matches {selector}")))
            }
        }

        /// Count elements matching a selector
        pub async fn query_count(&self, selector: &Selector) -> TestkitResult<usize> {
            let count: u64 = self.eval(&selector.to_count_query()).await?;
            Ok(usize::try_from(count).unwrap_or(usize::MAX))
        }

        /// Count elements matching a selector that are also visible
        pub async fn query_visible_count(&self, selector: &Selector) -> TestkitResult<usize> {
            let count: u64 = self.eval(&selector.to_visible_count_query()).await?;
            Ok(usize::try_from(count).unwrap_or(usize::MAX))
        }

        /// Text content of the first matching element, if any
        pub async fn text_content(&self, selector: &Selector) -> TestkitResult<Option<String>> {
            let script = format!(
                "(el => el ? el.textContent : null)({})",
                selector.to_query()
            );
            self.eval(&script).await
        }

        /// Current URL as the browser reports it
        pub async fn resolved_url(&self) -> TestkitResult<String> {
            let url = self.inner.url().await.map_err(|e| TestkitError::PageError {
                message: e.to_string(),
            })?;
            Ok(url.unwrap_or_else(|| self.url.clone()))
        }

        /// URL of the last navigation
        #[must_use]
        pub fn current_url(&self) -> &str {
            &self.url
        }

        /// Responses observed by this page
        #[must_use]
        pub const fn responses(&self) -> &ResponseLog {
            &self.responses
        }
    }
}

// ============================================================================
// Mock Implementation (when `browser` feature is NOT enabled)
// ============================================================================

#[cfg(not(feature = "browser"))]
#[allow(clippy::missing_const_for_fn)]
mod mock {
    use super::{BrowserConfig, HttpMethod, MockRouter, ResponseLog, TestkitError, TestkitResult};
    use crate::locator::Selector;
    use crate::network::RouteDecision;
    use std::collections::HashMap;

    /// Browser instance (mock when `browser` feature disabled)
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
    }

    impl Browser {
        /// Launch a new browser instance (mock)
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub fn launch(config: BrowserConfig) -> TestkitResult<Self> {
            Ok(Self { config })
        }

        /// Create a new page
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub fn new_page(&self) -> TestkitResult<Page> {
            Ok(Page::new())
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }
    }

    /// A scriptable page standing in for a real browser.
    ///
    /// Tests seed element counts and text contents, then exercise the same
    /// page-object code paths the CDP page would take.
    #[derive(Debug, Default)]
    pub struct Page {
        url: String,
        responses: ResponseLog,
        element_counts: HashMap<String, usize>,
        hidden: std::collections::HashSet<String>,
        texts: HashMap<String, String>,
        actions: Vec<String>,
        router: Option<MockRouter>,
    }

    impl Page {
        /// Create a blank page
        #[must_use]
        pub fn new() -> Self {
            Self {
                url: String::from("about:blank"),
                ..Self::default()
            }
        }

        /// Install a route table
        ///
        /// # Errors
        ///
        /// Infallible in mock mode
        pub fn install_router(&mut self, router: MockRouter) -> TestkitResult<()> {
            self.router = Some(router);
            Ok(())
        }

        /// Resolve a simulated request against the installed routes
        pub fn simulate_request(&mut self, url: &str, method: &HttpMethod) -> RouteDecision {
            self.router
                .as_mut()
                .map_or(RouteDecision::Continue, |r| r.resolve(url, method))
        }

        /// Navigate to a URL
        ///
        /// # Errors
        ///
        /// Infallible in mock mode
        pub fn goto(&mut self, url: &str) -> TestkitResult<()> {
            self.url = url.to_string();
            self.actions.push(format!("goto {url}"));
            Ok(())
        }

        /// Seed the URL the page reports, as if a redirect landed here
        pub fn set_url(&mut self, url: impl Into<String>) {
            self.url = url.into();
        }

        /// Seed how many elements a selector matches
        pub fn set_element_count(&mut self, selector: &Selector, count: usize) {
            self.element_counts.insert(selector.to_string(), count);
        }

        /// Seed a selector's matches as present but not visible
        pub fn set_element_hidden(&mut self, selector: &Selector) {
            self.hidden.insert(selector.to_string());
        }

        /// Seed the text content a selector resolves to
        pub fn set_text(&mut self, selector: &Selector, text: impl Into<String>) {
            let text = text.into();
            self.texts.insert(selector.to_string(), text);
            self.element_counts.insert(selector.to_string(), 1);
        }

        /// Type a value into the element a selector resolves to
        ///
        /// # Errors
        ///
        /// Infallible in mock mode
        pub fn fill(&mut self, selector: &Selector, value: &str) -> TestkitResult<()> {
            self.actions.push(format!("fill {selector} = {value}"));
            Ok(())
        }

        /// Click the element a selector resolves to
        ///
        /// # Errors
        ///
        /// Infallible in mock mode
        pub fn click(&mut self, selector: &Selector) -> TestkitResult<()> {
            self.actions.push(format!("click {selector}"));
            Ok(())
        }

        /// Count elements matching a selector
        ///
        /// # Errors
        ///
        /// Infallible in mock mode
        pub fn query_count(&self, selector: &Selector) -> TestkitResult<usize> {
            Ok(self
                .element_counts
                .get(&selector.to_string())
                .copied()
                .unwrap_or(0))
        }

        /// Count elements matching a selector that are also visible
        ///
        /// # Errors
        ///
        /// Infallible in mock mode
        pub fn query_visible_count(&self, selector: &Selector) -> TestkitResult<usize> {
            if self.hidden.contains(&selector.to_string()) {
                return Ok(0);
            }
            self.query_count(selector)
        }

        /// Text content of the first matching element, if any
        ///
        /// # Errors
        ///
        /// Infallible in mock mode
        pub fn text_content(&self, selector: &Selector) -> TestkitResult<Option<String>> {
            Ok(self.texts.get(&selector.to_string()).cloned())
        }

        /// Evaluate an expression (mock returns error)
        ///
        /// # Errors
        ///
        /// Always errors in mock mode
        pub fn eval<T: serde::de::DeserializeOwned>(&self, _expr: &str) -> TestkitResult<T> {
            Err(TestkitError::PageError {
                message:
                    "Browser feature not enabled. Enable 'browser' feature for real CDP support."
                        .to_string(),
            })
        }

        /// URL of the last navigation
        #[must_use]
        pub fn current_url(&self) -> &str {
            &self.url
        }

        /// Responses observed by this page
        #[must_use]
        pub const fn responses(&self) -> &ResponseLog {
            &self.responses
        }

        /// Actions performed so far, in order
        #[must_use]
        pub fn actions(&self) -> &[String] {
            &self.actions
        }
    }
}

// Re-export based on feature
#[cfg(feature = "browser")]
pub use cdp::{Browser, Page};

#[cfg(not(feature = "browser"))]
pub use mock::{Browser, Page};
