//! Page Object Model support and the login page object.
//!
//! Page objects encapsulate the structure of a page behind intent-named
//! operations so tests read as flows, not selector soup. [`LoginPage`] covers
//! the Conduit sign-in form: navigation, credential submission, the
//! response-race variant of submission, and bounded success/error detection
//! through ordered [`StrategyChain`]s.

use crate::browser::Page;
use crate::config::TestConfig;
use crate::locator::{DetectionStrategy, Locator, Selector, StrategyChain};
use crate::result::TestkitResult;
use crate::wait::RetryConfig;

/// Trait for page objects representing a page or component in the UI.
pub trait PageObject {
    /// URL pattern that matches this page (e.g., "/login", "/users/*")
    fn url_pattern(&self) -> &str;

    /// Check if the page is fully loaded and ready for interaction
    fn is_loaded(&self) -> bool {
        true
    }

    /// Optional wait time for page load (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        30000
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Page object for the sign-in form.
#[derive(Debug, Clone)]
pub struct LoginPage {
    login_url: String,
    home_url: String,
    email_input: Locator,
    password_input: Locator,
    signin_button: Locator,
    signin_nav_link: Locator,
    error_messages: Locator,
}

impl PageObject for LoginPage {
    fn url_pattern(&self) -> &str {
        "/login"
    }

    fn page_name(&self) -> &str {
        "LoginPage"
    }
}

impl LoginPage {
    /// Build the page object from test configuration
    #[must_use]
    pub fn new(config: &TestConfig) -> Self {
        Self {
            login_url: config.login_url(),
            home_url: config.home_url(),
            email_input: Locator::new(Selector::placeholder("Email")),
            password_input: Locator::new(Selector::placeholder("Password")),
            signin_button: Locator::new(Selector::role("button", "Sign in")),
            signin_nav_link: Locator::new(Selector::role("link", "Sign in")),
            error_messages: Locator::new(Selector::css(".error-messages li")),
        }
    }

    /// Full URL of the sign-in form
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Signals that only render for an authenticated session, most specific
    /// first. Any one hit counts as success; the leniency is deliberate, the
    /// three labels only exist in the logged-in nav.
    #[must_use]
    pub fn success_chain() -> StrategyChain {
        StrategyChain::new()
            .then(DetectionStrategy::new(
                "your-feed-link",
                Selector::role("link", "Your Feed"),
            ))
            .then(DetectionStrategy::new(
                "new-article-link",
                Selector::text("New Article"),
            ))
            .then(DetectionStrategy::new(
                "settings-link",
                Selector::text("Settings"),
            ))
    }

    /// Signals of a rejected login, most specific first: the exact message
    /// in the error list, then an ARIA alert carrying it, then any error
    /// list item at all.
    #[must_use]
    pub fn error_chain(message: &str) -> StrategyChain {
        StrategyChain::new()
            .then(DetectionStrategy::new(
                "error-list-message",
                Selector::css(".error-messages li").with_text(message),
            ))
            .then(DetectionStrategy::new(
                "alert-role-message",
                Selector::role("alert", message),
            ))
            .then(DetectionStrategy::new(
                "any-error-item",
                Selector::css(".error-messages li"),
            ))
    }

    /// Evaluate the success chain against an element-count probe.
    ///
    /// # Errors
    ///
    /// Returns the chain description as the failure message when no
    /// strategy matches.
    pub fn check_success<F>(probe: F) -> Result<(), String>
    where
        F: FnMut(&Selector) -> usize,
    {
        let chain = Self::success_chain();
        match chain.evaluate(probe) {
            Some(strategy) => {
                tracing::debug!(strategy = strategy.name.as_str(), "login success detected");
                Ok(())
            }
            None => Err(format!("no success signal found; tried {}", chain.describe())),
        }
    }

    /// Evaluate the error chain against an element-count probe.
    ///
    /// # Errors
    ///
    /// Returns the chain description as the failure message when no
    /// strategy matches.
    pub fn check_error<F>(message: &str, probe: F) -> Result<(), String>
    where
        F: FnMut(&Selector) -> usize,
    {
        let chain = Self::error_chain(message);
        match chain.evaluate(probe) {
            Some(strategy) => {
                tracing::debug!(strategy = strategy.name.as_str(), "login error detected");
                Ok(())
            }
            None => Err(format!(
                "no error signal for {message:?}; tried {}",
                chain.describe()
            )),
        }
    }

    /// Whether `url` is the home feed. Trailing slashes are not significant,
    /// so "/login" never counts as home.
    fn is_home_url(&self, url: &str) -> bool {
        url.trim_end_matches('/') == self.home_url.trim_end_matches('/')
    }
}

#[cfg(not(feature = "browser"))]
impl LoginPage {
    /// Navigate to the sign-in form
    ///
    /// # Errors
    ///
    /// Returns error if navigation fails
    pub fn goto(&self, page: &mut Page) -> TestkitResult<()> {
        page.goto(&self.login_url)
    }

    /// Match count for a locator, honoring its visibility option
    fn count(page: &Page, locator: &Locator) -> TestkitResult<usize> {
        if locator.options().visible {
            page.query_visible_count(locator.selector())
        } else {
            page.query_count(locator.selector())
        }
    }

    /// Submit credentials: follow the nav link if the form is not already
    /// shown, fill both fields, click the button.
    ///
    /// # Errors
    ///
    /// Returns error if any interaction fails
    pub fn login(&self, page: &mut Page, email: &str, password: &str) -> TestkitResult<()> {
        if Self::count(page, &self.signin_nav_link)? > 0 {
            page.click(self.signin_nav_link.selector())?;
        }
        page.fill(self.email_input.selector(), email)?;
        page.fill(self.password_input.selector(), password)?;
        page.click(self.signin_button.selector())
    }

    /// Submit credentials racing the click against the login response.
    ///
    /// # Errors
    ///
    /// Returns error if interaction fails or the response never arrives
    pub fn login_and_wait_for_response(
        &self,
        page: &mut Page,
        email: &str,
        password: &str,
    ) -> TestkitResult<crate::network::ResponseEvent> {
        let waiter = crate::network::ResponseWaiter::new(
            page.responses().clone(),
            crate::network::UrlPattern::Glob("**/api/users/login".to_string()),
        );
        self.login(page, email, password)?;
        waiter.wait_blocking()
    }

    /// Assert an authenticated session within `config`'s budget.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` naming every strategy tried
    pub fn expect_login_success_with(
        &self,
        page: &Page,
        config: RetryConfig,
    ) -> TestkitResult<()> {
        let mut check = || {
            if !self.is_home_url(page.current_url()) {
                return Err(format!(
                    "still on {} (expected {})",
                    page.current_url(),
                    self.home_url
                ));
            }
            Self::check_success(|selector| page.query_visible_count(selector).unwrap_or(0))
        };
        crate::wait::RetryAssertion::new("login success", &mut check)
            .with_config(config)
            .verify()
    }

    /// Assert an authenticated session within the default 15s budget.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` naming every strategy tried
    pub fn expect_login_success(&self, page: &Page) -> TestkitResult<()> {
        self.expect_login_success_with(page, RetryConfig::login_success())
    }

    /// Assert a rejected login showing `message` within `config`'s budget.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` naming every strategy tried
    pub fn expect_login_error_with(
        &self,
        page: &Page,
        message: &str,
        config: RetryConfig,
    ) -> TestkitResult<()> {
        let mut check = || {
            Self::check_error(message, |selector| {
                page.query_visible_count(selector).unwrap_or(0)
            })
        };
        crate::wait::RetryAssertion::new(format!("login error {message:?}"), &mut check)
            .with_config(config)
            .verify()
    }

    /// Assert a rejected login showing `message`.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` naming every strategy tried
    pub fn expect_login_error(&self, page: &Page, message: &str) -> TestkitResult<()> {
        self.expect_login_error_with(page, message, RetryConfig::default())
    }
}

#[cfg(feature = "browser")]
impl LoginPage {
    /// Navigate to the sign-in form
    ///
    /// # Errors
    ///
    /// Returns error if navigation fails
    pub async fn goto(&self, page: &mut Page) -> TestkitResult<()> {
        page.goto(&self.login_url).await
    }

    /// Match count for a locator, honoring its visibility option
    async fn count(page: &Page, locator: &Locator) -> TestkitResult<usize> {
        let count: u64 = page.eval(&locator.count_query()).await?;
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }

    /// Submit credentials: follow the nav link if the form is not already
    /// shown, fill both fields, click the button.
    ///
    /// # Errors
    ///
    /// Returns error if any interaction fails
    pub async fn login(&self, page: &Page, email: &str, password: &str) -> TestkitResult<()> {
        if Self::count(page, &self.signin_nav_link).await? > 0 {
            page.click(self.signin_nav_link.selector()).await?;
        }
        page.fill(self.email_input.selector(), email).await?;
        page.fill(self.password_input.selector(), password).await?;
        page.click(self.signin_button.selector()).await
    }

    /// Submit credentials racing the click against the login response.
    ///
    /// The response waiter is registered before the click so the response
    /// cannot be missed, then awaited with a 20s budget tolerating any
    /// status in 200..=499.
    ///
    /// # Errors
    ///
    /// Returns error if interaction fails or the response never arrives
    pub async fn login_and_wait_for_response(
        &self,
        page: &Page,
        email: &str,
        password: &str,
    ) -> TestkitResult<crate::network::ResponseEvent> {
        let waiter = crate::network::ResponseWaiter::new(
            page.responses().clone(),
            crate::network::UrlPattern::Glob("**/api/users/login".to_string()),
        );
        self.login(page, email, password).await?;
        waiter.wait().await
    }

    /// Assert an authenticated session within the default 15s budget.
    ///
    /// Only strategies whose element is visible in the layout count.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` naming every strategy tried
    pub async fn expect_login_success(&self, page: &Page) -> TestkitResult<()> {
        let chain = Self::success_chain();
        let waited_for = format!("login success ({})", chain.describe());
        let chain = &chain;
        crate::wait::wait_until(RetryConfig::login_success(), &waited_for, move || {
            async move {
                let url = page.resolved_url().await?;
                if !self.is_home_url(&url) {
                    return Ok(false);
                }
                for strategy in chain.strategies() {
                    if page.query_visible_count(&strategy.selector).await? > 0 {
                        tracing::debug!(
                            strategy = strategy.name.as_str(),
                            "login success detected"
                        );
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        })
        .await
    }

    /// Assert a rejected login showing `message`.
    ///
    /// Only strategies whose element is visible in the layout count.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` naming every strategy tried
    pub async fn expect_login_error(&self, page: &Page, message: &str) -> TestkitResult<()> {
        let chain = Self::error_chain(message);
        let waited_for = format!("login error {message:?} ({})", chain.describe());
        let chain = &chain;
        crate::wait::wait_until(RetryConfig::default(), &waited_for, move || async move {
            for strategy in chain.strategies() {
                if page.query_visible_count(&strategy.selector).await? > 0 {
                    tracing::debug!(strategy = strategy.name.as_str(), "login error detected");
                    return Ok(true);
                }
            }
            Ok(false)
        })
        .await
    }

    /// Text of the first error list item, if rendered
    ///
    /// # Errors
    ///
    /// Returns error if the query fails
    pub async fn error_message(&self, page: &Page) -> TestkitResult<Option<String>> {
        page.text_content(self.error_messages.selector()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> TestConfig {
        TestConfig::default()
    }

    #[test]
    fn test_page_object_metadata() {
        let login = LoginPage::new(&test_config());
        assert_eq!(login.url_pattern(), "/login");
        assert_eq!(login.page_name(), "LoginPage");
        assert!(login.is_loaded());
        assert!(login.login_url().ends_with("/login"));
    }

    mod chain_tests {
        use super::*;

        #[test]
        fn test_success_chain_order() {
            let chain = LoginPage::success_chain();
            let names: Vec<&str> = chain.strategies().iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, ["your-feed-link", "new-article-link", "settings-link"]);
        }

        #[test]
        fn test_check_success_first_match_wins() {
            let mut probed = Vec::new();
            let result = LoginPage::check_success(|selector| {
                probed.push(selector.to_string());
                1
            });
            assert!(result.is_ok());
            // Short-circuits on the first strategy.
            assert_eq!(probed.len(), 1);
        }

        #[test]
        fn test_check_success_falls_through_to_later_strategy() {
            let mut calls = 0;
            let result = LoginPage::check_success(|_| {
                calls += 1;
                usize::from(calls == 3)
            });
            assert!(result.is_ok());
            assert_eq!(calls, 3);
        }

        #[test]
        fn test_check_success_failure_names_all_strategies() {
            let err = LoginPage::check_success(|_| 0).unwrap_err();
            assert!(err.contains("your-feed-link"));
            assert!(err.contains("settings-link"));
        }

        #[test]
        fn test_error_chain_prefers_exact_message() {
            let chain = LoginPage::error_chain("email or password is invalid");
            assert_eq!(chain.strategies()[0].name, "error-list-message");
            let found = chain.evaluate(|_| 1).unwrap();
            assert_eq!(found.name, "error-list-message");
        }

        #[test]
        fn test_check_error_fallback_to_any_item() {
            let mut calls = 0;
            let result = LoginPage::check_error("email or password is invalid", |_| {
                calls += 1;
                usize::from(calls == 3)
            });
            assert!(result.is_ok());
        }
    }

    #[cfg(not(feature = "browser"))]
    mod flow_tests {
        use super::*;
        use crate::browser::Page;
        use std::time::Duration;

        fn fast() -> RetryConfig {
            RetryConfig::new(Duration::from_millis(30))
                .with_poll_interval(Duration::from_millis(5))
        }

        #[test]
        fn test_login_fills_and_submits() {
            let config = test_config();
            let login = LoginPage::new(&config);
            let mut page = Page::new();
            login.goto(&mut page).unwrap();
            assert_eq!(page.current_url(), config.login_url());

            login
                .login(&mut page, "testuser@example.com", "Test123!")
                .unwrap();
            let actions = page.actions().join("\n");
            assert!(actions.contains("fill placeholder=Email = testuser@example.com"));
            assert!(actions.contains("fill placeholder=Password = Test123!"));
            assert!(actions.contains("click role=button[name=Sign in]"));
        }

        #[test]
        fn test_login_follows_nav_link_when_present() {
            let config = test_config();
            let login = LoginPage::new(&config);
            let mut page = Page::new();
            page.set_element_count(&Selector::role("link", "Sign in"), 1);
            login.login(&mut page, "a@b.c", "pw").unwrap();
            assert!(page.actions()[0].contains("click role=link[name=Sign in]"));
        }

        #[test]
        fn test_expect_success_requires_home_url() {
            let config = test_config();
            let login = LoginPage::new(&config);
            let mut page = Page::new();
            page.set_element_count(&Selector::role("link", "Your Feed"), 1);
            page.set_url(config.login_url());

            let err = login.expect_login_success_with(&page, fast()).unwrap_err();
            assert!(err.to_string().contains("Timed out"));

            page.set_url(config.home_url());
            login.expect_login_success_with(&page, fast()).unwrap();
        }

        #[test]
        fn test_expect_error_sees_rendered_message() {
            let login = LoginPage::new(&test_config());
            let mut page = Page::new();
            page.set_text(
                &Selector::css(".error-messages li").with_text("email or password is invalid"),
                "email or password is invalid",
            );
            login
                .expect_login_error_with(&page, "email or password is invalid", fast())
                .unwrap();
        }

        #[test]
        fn test_expect_error_ignores_hidden_message() {
            let login = LoginPage::new(&test_config());
            let mut page = Page::new();
            let error_item = Selector::css(".error-messages li");
            page.set_element_count(&error_item, 1);
            page.set_element_hidden(&error_item);
            let err = login
                .expect_login_error_with(&page, "email or password is invalid", fast())
                .unwrap_err();
            assert!(err.to_string().contains("Timed out"));
        }

        #[test]
        fn test_expect_success_ignores_hidden_nav_label() {
            let config = test_config();
            let login = LoginPage::new(&config);
            let mut page = Page::new();
            page.set_url(config.home_url());
            let feed_link = Selector::role("link", "Your Feed");
            page.set_element_count(&feed_link, 1);
            page.set_element_hidden(&feed_link);
            let err = login.expect_login_success_with(&page, fast()).unwrap_err();
            assert!(err.to_string().contains("Timed out"));

            // The same element counts once it is visible.
            let mut page = Page::new();
            page.set_url(config.home_url());
            page.set_element_count(&feed_link, 1);
            login.expect_login_success_with(&page, fast()).unwrap();
        }

        #[test]
        fn test_login_race_observes_recorded_response() {
            use crate::network::{HttpMethod, ResponseEvent};

            let login = LoginPage::new(&test_config());
            let mut page = Page::new();
            page.responses().record(ResponseEvent {
                url: "https://api.realworld.io/api/users/login".to_string(),
                status: 422,
                method: HttpMethod::Post,
            });
            let event = login
                .login_and_wait_for_response(&mut page, "a@b.c", "wrong")
                .expect("response was recorded");
            assert_eq!(event.status, 422);
        }

        #[test]
        fn test_expect_error_times_out_on_clean_page() {
            let login = LoginPage::new(&test_config());
            let page = Page::new();
            let err = login
                .expect_login_error_with(&page, "email or password is invalid", fast())
                .unwrap_err();
            assert!(err.to_string().contains("login error"));
        }
    }
}
