//! Route mocking and network response waiting.
//!
//! A [`MockRouter`] holds routes registered for the duration of a single
//! test. A matched request is answered with its [`MockResponse`]; unmatched
//! requests fall through to the real network unless `block_unmatched` is
//! set. The [`ResponseWaiter`] implements the register-then-act race used by
//! the login flow: interest in a URL pattern is recorded *before* the click
//! that triggers the request, then awaited with a bounded timeout.

use crate::result::{TestkitError, TestkitResult};
use crate::wait::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// HTTP methods for request matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
    /// PATCH request
    Patch,
    /// Any method
    Any,
}

impl HttpMethod {
    /// Parse from a wire string
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            _ => Self::Any,
        }
    }

    /// Convert to string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Any => "*",
        }
    }

    /// Check if this method matches another
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        *self == Self::Any || *other == Self::Any || *self == *other
    }
}

/// Pattern for matching request URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g., "**/api/users/login")
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern),
            Self::Contains(pattern) => url.contains(pattern),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => Self::glob_matches(pattern, url),
            Self::Any => true,
        }
    }

    /// Simple glob matching for URLs. Literal text before the first `*`
    /// anchors at the start, text after the last `*` anchors at the end;
    /// anchoring the tail keeps a match like `*/login` from being stolen by
    /// an earlier occurrence of the suffix mid-URL.
    fn glob_matches(pattern: &str, url: &str) -> bool {
        let mut parts = pattern.split('*');
        let first = parts.next().unwrap_or("");
        if !url.starts_with(first) {
            return false;
        }
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() {
            // No `*` in the pattern: exact match only.
            return url.len() == first.len();
        }

        let mut pos = first.len();
        let (last, middle) = rest.split_last().unwrap_or((&"", &[]));
        for part in middle {
            if part.is_empty() {
                continue;
            }
            match url[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }

        last.is_empty() || url[pos..].ends_with(*last)
    }
}

/// A mocked HTTP response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
    /// Content type
    pub content_type: String,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
            content_type: "application/json".to_string(),
        }
    }
}

impl MockResponse {
    /// Create a 200 JSON response from a serializable payload
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: Serialize>(data: &T) -> TestkitResult<Self> {
        Ok(Self {
            body: serde_json::to_vec(data)?,
            ..Self::default()
        })
    }

    /// Set status code, validating it is a real HTTP code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` outside 100..=599.
    pub fn with_status(mut self, status: u16) -> TestkitResult<Self> {
        if !(100..=599).contains(&status) {
            return Err(TestkitError::InvalidStatus { status });
        }
        self.status = status;
        Ok(self)
    }

    /// Set body bytes
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Get body as string
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// A route registered for the duration of a single test
#[derive(Debug, Clone)]
pub struct Route {
    /// URL pattern to match
    pub pattern: UrlPattern,
    /// HTTP method to match
    pub method: HttpMethod,
    /// Response to return
    pub response: MockResponse,
    /// Number of times this route should be used (None = unlimited)
    pub times: Option<usize>,
    match_count: usize,
}

impl Route {
    /// Create a new route
    #[must_use]
    pub fn new(pattern: UrlPattern, method: HttpMethod, response: MockResponse) -> Self {
        Self {
            pattern,
            method,
            response,
            times: None,
            match_count: 0,
        }
    }

    /// Limit how many requests this route answers
    #[must_use]
    pub const fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Check if this route matches a request
    #[must_use]
    pub fn matches(&self, url: &str, method: &HttpMethod) -> bool {
        if let Some(max) = self.times {
            if self.match_count >= max {
                return false;
            }
        }
        self.pattern.matches(url) && self.method.matches(method)
    }
}

/// Decision for an intercepted request
#[derive(Debug, Clone)]
pub enum RouteDecision {
    /// Answer with a registered mock
    Fulfill(MockResponse),
    /// Let the request reach the real network
    Continue,
    /// Fail the request (only with `block_unmatched`)
    Block,
}

/// Route table for one test's network interception.
#[derive(Debug, Default)]
pub struct MockRouter {
    routes: Vec<Route>,
    block_unmatched: bool,
}

impl MockRouter {
    /// Create an empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail requests no route matches instead of passing them through
    #[must_use]
    pub const fn block_unmatched(mut self) -> Self {
        self.block_unmatched = true;
        self
    }

    /// Register a route
    pub fn route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Resolve an intercepted request. Unmatched requests continue to the
    /// real network, the accepted fallback of this design.
    pub fn resolve(&mut self, url: &str, method: &HttpMethod) -> RouteDecision {
        for route in &mut self.routes {
            if route.matches(url, method) {
                route.match_count += 1;
                tracing::debug!(url, method = method.as_str(), "request fulfilled by mock route");
                return RouteDecision::Fulfill(route.response.clone());
            }
        }
        if self.block_unmatched {
            RouteDecision::Block
        } else {
            RouteDecision::Continue
        }
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the router is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// An observed network response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEvent {
    /// Response URL
    pub url: String,
    /// HTTP status
    pub status: u16,
    /// Request method
    pub method: HttpMethod,
}

/// Shared log of responses observed by the page.
///
/// The browser layer records every finished response here; waiters poll it.
#[derive(Debug, Clone, Default)]
pub struct ResponseLog {
    events: Arc<Mutex<Vec<ResponseEvent>>>,
}

impl ResponseLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observed response
    pub fn record(&self, event: ResponseEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Find the first event matching a predicate
    pub fn find<F>(&self, predicate: F) -> Option<ResponseEvent>
    where
        F: Fn(&ResponseEvent) -> bool,
    {
        self.events
            .lock()
            .ok()
            .and_then(|events| events.iter().find(|e| predicate(e)).cloned())
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Waits for a response matching a URL pattern within a status range.
///
/// Register the waiter *before* the action that triggers the request, then
/// perform the action, then await. The default budget is 20 seconds and the
/// default accepted range 200..=499, tolerant enough to observe rejected
/// logins without treating them as transport failures.
#[derive(Debug, Clone)]
pub struct ResponseWaiter {
    pattern: UrlPattern,
    status_range: RangeInclusive<u16>,
    config: RetryConfig,
    log: ResponseLog,
}

impl ResponseWaiter {
    /// Register interest in responses matching `pattern` on `log`.
    #[must_use]
    pub fn new(log: ResponseLog, pattern: UrlPattern) -> Self {
        Self {
            pattern,
            status_range: 200..=499,
            config: RetryConfig::network_response(),
            log,
        }
    }

    /// Override the accepted status range
    #[must_use]
    pub fn with_status_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.status_range = range;
        self
    }

    /// Override the wait budget
    #[must_use]
    pub const fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Check the log once for a satisfying response
    #[must_use]
    pub fn check(&self) -> Option<ResponseEvent> {
        self.log
            .find(|e| self.pattern.matches(&e.url) && self.status_range.contains(&e.status))
    }

    /// Block until a satisfying response is observed or the budget expires.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` describing the awaited pattern.
    pub fn wait_blocking(&self) -> TestkitResult<ResponseEvent> {
        let start = Instant::now();
        loop {
            if let Some(event) = self.check() {
                return Ok(event);
            }
            if start.elapsed() >= self.config.timeout {
                return Err(TestkitError::timeout(
                    self.config.timeout_ms(),
                    format!("response matching {:?}", self.pattern),
                ));
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Await a satisfying response without blocking the runtime.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` describing the awaited pattern.
    #[cfg(feature = "browser")]
    pub async fn wait(&self) -> TestkitResult<ResponseEvent> {
        let start = Instant::now();
        loop {
            if let Some(event) = self.check() {
                return Ok(event);
            }
            if start.elapsed() >= self.config.timeout {
                return Err(TestkitError::timeout(
                    self.config.timeout_ms(),
                    format!("response matching {:?}", self.pattern),
                ));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    mod pattern_tests {
        use super::*;

        #[test]
        fn test_glob_matches_login_endpoint() {
            let pattern = UrlPattern::Glob("**/api/users/login".to_string());
            assert!(pattern.matches("https://api.realworld.io/api/users/login"));
            assert!(pattern.matches("http://localhost:3000/api/users/login"));
            assert!(!pattern.matches("https://api.realworld.io/api/users"));
        }

        #[test]
        fn test_glob_suffix_anchors_at_end() {
            let pattern = UrlPattern::Glob("*/login".to_string());
            // The earlier mid-URL occurrence of the suffix must not consume
            // the match.
            assert!(pattern.matches("http://x/login/extra/login"));
            assert!(pattern.matches("http://x/login"));
            assert!(!pattern.matches("http://x/login/extra"));
        }

        #[test]
        fn test_glob_without_wildcard_is_exact() {
            let pattern = UrlPattern::Glob("http://x/login".to_string());
            assert!(pattern.matches("http://x/login"));
            assert!(!pattern.matches("http://x/login/extra"));
        }

        #[test]
        fn test_glob_trailing_wildcard() {
            let pattern = UrlPattern::Glob("**/api/articles*".to_string());
            assert!(pattern.matches("http://x/api/articles"));
            assert!(pattern.matches("http://x/api/articles?limit=10"));
            assert!(pattern.matches("http://x/api/articles/feed"));
        }

        #[test]
        fn test_exact_prefix_contains() {
            assert!(UrlPattern::Exact("http://a/b".to_string()).matches("http://a/b"));
            assert!(UrlPattern::Prefix("http://a".to_string()).matches("http://a/b"));
            assert!(UrlPattern::Contains("/tags".to_string()).matches("http://a/api/tags?x=1"));
            assert!(UrlPattern::Any.matches("anything"));
        }

        #[test]
        fn test_regex_pattern() {
            let pattern = UrlPattern::Regex(r"/api/articles(\?.*)?$".to_string());
            assert!(pattern.matches("http://x/api/articles"));
            assert!(pattern.matches("http://x/api/articles?limit=10"));
            assert!(!pattern.matches("http://x/api/articles/feed"));
        }

        #[test]
        fn test_invalid_regex_never_matches() {
            assert!(!UrlPattern::Regex("(".to_string()).matches("anything"));
        }
    }

    mod method_tests {
        use super::*;

        #[test]
        fn test_parse() {
            assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
            assert_eq!(HttpMethod::parse("GET"), HttpMethod::Get);
            assert_eq!(HttpMethod::parse("TRACE"), HttpMethod::Any);
        }

        #[test]
        fn test_any_matches_everything() {
            assert!(HttpMethod::Any.matches(&HttpMethod::Post));
            assert!(HttpMethod::Post.matches(&HttpMethod::Any));
            assert!(!HttpMethod::Post.matches(&HttpMethod::Get));
        }
    }

    mod mock_response_tests {
        use super::*;

        #[test]
        fn test_default_is_json_200() {
            let response = MockResponse::default();
            assert_eq!(response.status, 200);
            assert_eq!(response.content_type, "application/json");
        }

        #[test]
        fn test_with_status_validates_range() {
            assert!(MockResponse::default().with_status(422).is_ok());
            assert!(MockResponse::default().with_status(100).is_ok());
            assert!(MockResponse::default().with_status(599).is_ok());
            assert!(matches!(
                MockResponse::default().with_status(600),
                Err(TestkitError::InvalidStatus { status: 600 })
            ));
            assert!(MockResponse::default().with_status(99).is_err());
        }

        #[test]
        fn test_json_body() {
            let response = MockResponse::json(&serde_json::json!({
                "errors": { "email or password": ["is invalid"] }
            }))
            .unwrap();
            assert!(response.body_string().contains("is invalid"));
        }
    }

    mod router_tests {
        use super::*;

        fn login_rejection_route() -> Route {
            let response = MockResponse::json(&serde_json::json!({
                "errors": { "email or password": ["is invalid"] }
            }))
            .unwrap()
            .with_status(422)
            .unwrap();
            Route::new(
                UrlPattern::Glob("**/api/users/login".to_string()),
                HttpMethod::Post,
                response,
            )
        }

        #[test]
        fn test_mocked_login_rejection() {
            let mut router = MockRouter::new();
            router.route(login_rejection_route());

            match router.resolve("https://api.realworld.io/api/users/login", &HttpMethod::Post) {
                RouteDecision::Fulfill(response) => {
                    assert_eq!(response.status, 422);
                    assert!(response.body_string().contains("email or password"));
                }
                other => panic!("expected fulfill, got {other:?}"),
            }
        }

        #[test]
        fn test_method_mismatch_falls_through() {
            let mut router = MockRouter::new();
            router.route(login_rejection_route());
            assert!(matches!(
                router.resolve("https://x/api/users/login", &HttpMethod::Get),
                RouteDecision::Continue
            ));
        }

        #[test]
        fn test_unmatched_continues_by_default() {
            let mut router = MockRouter::new();
            assert!(matches!(
                router.resolve("https://x/api/tags", &HttpMethod::Get),
                RouteDecision::Continue
            ));
        }

        #[test]
        fn test_block_unmatched() {
            let mut router = MockRouter::new().block_unmatched();
            assert!(matches!(
                router.resolve("https://x/api/tags", &HttpMethod::Get),
                RouteDecision::Block
            ));
        }

        #[test]
        fn test_times_limit_exhausts_route() {
            let mut router = MockRouter::new();
            router.route(login_rejection_route().times(1));

            let url = "https://x/api/users/login";
            assert!(matches!(
                router.resolve(url, &HttpMethod::Post),
                RouteDecision::Fulfill(_)
            ));
            assert!(matches!(
                router.resolve(url, &HttpMethod::Post),
                RouteDecision::Continue
            ));
        }
    }

    mod response_waiter_tests {
        use super::*;

        #[test]
        fn test_register_before_act_observes_response() {
            let log = ResponseLog::new();
            let waiter = ResponseWaiter::new(
                log.clone(),
                UrlPattern::Glob("**/api/users/login".to_string()),
            );

            // The action lands after the waiter is registered.
            assert!(waiter.check().is_none());
            log.record(ResponseEvent {
                url: "https://x/api/users/login".to_string(),
                status: 422,
                method: HttpMethod::Post,
            });

            let event = waiter.check().unwrap();
            assert_eq!(event.status, 422);
        }

        #[test]
        fn test_status_range_tolerates_4xx_not_5xx() {
            let log = ResponseLog::new();
            let waiter = ResponseWaiter::new(log.clone(), UrlPattern::Any);

            log.record(ResponseEvent {
                url: "https://x/api/users/login".to_string(),
                status: 500,
                method: HttpMethod::Post,
            });
            assert!(waiter.check().is_none());

            log.record(ResponseEvent {
                url: "https://x/api/users/login".to_string(),
                status: 200,
                method: HttpMethod::Post,
            });
            assert_eq!(waiter.check().unwrap().status, 200);
        }

        #[test]
        fn test_wait_blocking_times_out() {
            let log = ResponseLog::new();
            let waiter = ResponseWaiter::new(log, UrlPattern::Any).with_config(
                RetryConfig::new(Duration::from_millis(20))
                    .with_poll_interval(Duration::from_millis(5)),
            );
            let err = waiter.wait_blocking().unwrap_err();
            assert!(err.to_string().contains("response matching"));
        }

        #[test]
        fn test_default_budget_is_twenty_seconds() {
            let waiter = ResponseWaiter::new(ResponseLog::new(), UrlPattern::Any);
            assert_eq!(waiter.config.timeout, Duration::from_secs(20));
            assert_eq!(waiter.status_range, 200..=499);
        }
    }
}
