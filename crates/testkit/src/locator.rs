//! Locator abstraction for element selection.
//!
//! Selectors render to JavaScript query expressions evaluated in the page,
//! so the same `Selector` works for presence checks, counting, and actions.
//!
//! Detection of "page reached a state" is modeled as a [`StrategyChain`]: an
//! ordered list of named selectors evaluated with first-success-wins
//! semantics. The chain exists because the markup under test drifts; the
//! order makes the preference explicit instead of hiding it in parallel
//! checks.

use serde::{Deserialize, Serialize};

/// JS predicate for an element that actually takes up layout space. The
/// fallback covers pages where `checkVisibility` is not available.
const VISIBLE_PREDICATE: &str =
    "(el.checkVisibility ? el.checkVisibility() : el.getClientRects().length > 0)";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., ".error-messages li")
    Css(String),
    /// Input matched by its placeholder attribute
    Placeholder(String),
    /// Element matched by ARIA role and accessible name
    Role {
        /// ARIA role (e.g., "button", "link", "alert")
        role: String,
        /// Accessible name; empty matches any name
        name: String,
    },
    /// Element whose text content contains the given string
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    /// Create a role selector with an accessible name
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// CSS candidates that carry a given ARIA role, implicitly or explicitly.
    fn role_css(role: &str) -> String {
        match role {
            "button" => "button, [role=\"button\"], input[type=\"submit\"]".to_string(),
            "link" => "a, [role=\"link\"]".to_string(),
            "alert" => "[role=\"alert\"]".to_string(),
            other => format!("[role=\"{other}\"]"),
        }
    }

    /// CSS forms that match by attribute value. The value is quoted once,
    /// in Rust, so the rendered JS string stays valid whatever the value
    /// contains.
    fn placeholder_css(p: &str) -> String {
        format!("input[placeholder={p:?}], textarea[placeholder={p:?}]")
    }

    fn test_id_css(id: &str) -> String {
        format!("[data-testid={id:?}]")
    }

    /// Collection expression plus an optional per-element filter; the
    /// counting queries compose both.
    fn count_parts(&self) -> (String, Option<String>) {
        match self {
            Self::Css(s) => (format!("document.querySelectorAll({s:?})"), None),
            Self::Placeholder(p) => {
                let css = Self::placeholder_css(p);
                (format!("document.querySelectorAll({css:?})"), None)
            }
            Self::Role { role, name } => {
                let css = Self::role_css(role);
                let filter = if name.is_empty() {
                    None
                } else {
                    Some(format!(
                        "el.textContent.trim().includes({name:?}) || el.value === {name:?}"
                    ))
                };
                (format!("document.querySelectorAll({css:?})"), filter)
            }
            Self::Text(t) => (
                "document.querySelectorAll('*')".to_string(),
                Some(format!(
                    "el.children.length === 0 && el.textContent.includes({t:?})"
                )),
            ),
            Self::TestId(id) => {
                let css = Self::test_id_css(id);
                (format!("document.querySelectorAll({css:?})"), None)
            }
            Self::CssWithText { css, text } => (
                format!("document.querySelectorAll({css:?})"),
                Some(format!("el.textContent.includes({text:?})")),
            ),
        }
    }

    /// Convert to a JavaScript expression yielding the matched element (or
    /// `null`).
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({s:?})"),
            Self::Placeholder(p) => {
                let css = Self::placeholder_css(p);
                format!("document.querySelector({css:?})")
            }
            Self::Role { role, name } => {
                let css = Self::role_css(role);
                if name.is_empty() {
                    format!("document.querySelector({css:?})")
                } else {
                    format!(
                        "Array.from(document.querySelectorAll({css:?})).find(el => el.textContent.trim().includes({name:?}) || el.value === {name:?})"
                    )
                }
            }
            Self::Text(t) => {
                format!("Array.from(document.querySelectorAll('*')).find(el => el.children.length === 0 && el.textContent.includes({t:?}))")
            }
            Self::TestId(id) => {
                let css = Self::test_id_css(id);
                format!("document.querySelector({css:?})")
            }
            Self::CssWithText { css, text } => {
                format!("Array.from(document.querySelectorAll({css:?})).find(el => el.textContent.includes({text:?}))")
            }
        }
    }

    /// Convert to a JavaScript expression counting all matches.
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self.count_parts() {
            (collection, None) => format!("{collection}.length"),
            (collection, Some(filter)) => {
                format!("Array.from({collection}).filter(el => {filter}).length")
            }
        }
    }

    /// Convert to a JavaScript expression counting only matches that are
    /// visible in the layout.
    #[must_use]
    pub fn to_visible_count_query(&self) -> String {
        match self.count_parts() {
            (collection, None) => {
                format!("Array.from({collection}).filter(el => {VISIBLE_PREDICATE}).length")
            }
            (collection, Some(filter)) => format!(
                "Array.from({collection}).filter(el => {VISIBLE_PREDICATE} && ({filter})).length"
            ),
        }
    }

    /// Filter by text content, collapsing CSS selectors into `CssWithText`.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Css(css) => Self::CssWithText {
                css,
                text: text.into(),
            },
            other => other,
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Placeholder(p) => write!(f, "placeholder={p}"),
            Self::Role { role, name } => write!(f, "role={role}[name={name}]"),
            Self::Text(t) => write!(f, "text={t}"),
            Self::TestId(id) => write!(f, "testid={id}"),
            Self::CssWithText { css, text } => write!(f, "css={css}[text={text}]"),
        }
    }
}

/// Locator options for customizing behavior
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Whether the element must be visible to count as a match
    pub visible: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self { visible: true }
    }
}

/// A locator for finding and interacting with elements.
#[derive(Debug, Clone)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Set visibility requirement
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.options.visible = visible;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Counting query honoring the visibility option
    #[must_use]
    pub fn count_query(&self) -> String {
        if self.options.visible {
            self.selector.to_visible_count_query()
        } else {
            self.selector.to_count_query()
        }
    }
}

/// A named detection strategy: one way of recognizing a page state.
#[derive(Debug, Clone)]
pub struct DetectionStrategy {
    /// Short name used in failure messages
    pub name: String,
    /// Selector that proves the state when it matches
    pub selector: Selector,
}

impl DetectionStrategy {
    /// Create a named strategy
    #[must_use]
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
        }
    }
}

/// Ordered detection strategies evaluated first-success-wins.
///
/// `evaluate` takes a probe that reports the match count for a selector; the
/// first strategy with at least one match decides. On a miss the caller gets
/// every strategy name back for the timeout message.
#[derive(Debug, Clone, Default)]
pub struct StrategyChain {
    strategies: Vec<DetectionStrategy>,
}

impl StrategyChain {
    /// Create an empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy; earlier strategies take precedence.
    #[must_use]
    pub fn then(mut self, strategy: DetectionStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// The strategies, in evaluation order
    #[must_use]
    pub fn strategies(&self) -> &[DetectionStrategy] {
        &self.strategies
    }

    /// Evaluate the chain against a match-count probe. Returns the first
    /// strategy that matched, or `None` if all missed.
    pub fn evaluate<F>(&self, mut probe: F) -> Option<&DetectionStrategy>
    where
        F: FnMut(&Selector) -> usize,
    {
        self.strategies
            .iter()
            .find(|strategy| probe(&strategy.selector) > 0)
    }

    /// Human-readable list of strategies for failure messages
    #[must_use]
    pub fn describe(&self) -> String {
        self.strategies
            .iter()
            .map(|s| format!("{} ({})", s.name, s.selector))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the chain has no strategies
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
