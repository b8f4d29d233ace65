//! Client for the Conduit (RealWorld) HTTP API.
//!
//! Covers the two endpoints the load scenario exercises: token acquisition
//! via `POST /users/login` (with a registration fallback when login yields
//! no token) and article creation via `POST /articles`. Article creation
//! also verifies the API contract: the response must echo the submitted
//! title and description and carry every submitted tag.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};

/// An article payload to submit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    /// Article title
    pub title: String,
    /// Short description
    pub description: String,
    /// Body markdown
    pub body: String,
    /// Tags
    pub tag_list: Vec<String>,
}

impl ArticleDraft {
    /// A uniquely-titled probe article for load iterations.
    ///
    /// The millisecond timestamp keeps titles (and thus slugs) unique
    /// across concurrent workers.
    #[must_use]
    pub fn perf_probe() -> Self {
        let ms = chrono::Utc::now().timestamp_millis();
        Self {
            title: format!("Performance Test Article {ms}"),
            description: "Article created during performance testing".to_string(),
            body: "This is a test article body for load testing purposes.".to_string(),
            tag_list: vec!["performance".to_string(), "test".to_string()],
        }
    }
}

#[derive(Debug, Serialize)]
struct UserCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterCredentials<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: UserBody,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ArticleRequest<'a> {
    article: &'a ArticleDraft,
}

#[derive(Debug, Deserialize)]
struct ArticleEnvelope {
    article: ArticleBody,
}

/// The article fields the contract checks inspect
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleBody {
    /// Echoed title
    pub title: String,
    /// Echoed description
    #[serde(default)]
    pub description: String,
    /// Echoed tags
    #[serde(default)]
    pub tag_list: Vec<String>,
}

/// Client for the Conduit API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for an API base URL (e.g. `https://api.realworld.io/api`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client with a custom reqwest client (for custom timeouts, etc.)
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// API base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Obtain an auth token, registering the account if login yields none.
    ///
    /// The registration fallback covers fresh backends where the shared
    /// test account does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns error when neither login nor registration produces a token
    pub async fn login(&self, email: &str, password: &str, username: &str) -> CliResult<String> {
        let url = format!("{}/users/login", self.base_url);
        let body = serde_json::json!({
            "user": UserCredentials { email, password }
        });
        // A transport failure is treated the same as a token-less response:
        // the account may simply not exist yet.
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    if let Ok(envelope) = resp.json::<UserEnvelope>().await {
                        if let Some(token) = envelope.user.token {
                            return Ok(token);
                        }
                    }
                }
                tracing::warn!(
                    status = status.as_u16(),
                    email,
                    "login yielded no token, falling back to registration"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    email,
                    "login request failed, falling back to registration"
                );
            }
        }
        self.register(email, password, username).await
    }

    /// Register the account and return its token
    async fn register(&self, email: &str, password: &str, username: &str) -> CliResult<String> {
        let url = format!("{}/users", self.base_url);
        let body = serde_json::json!({
            "user": RegisterCredentials {
                username,
                email,
                password,
            }
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CliError::api_contract(format!(
                "registration failed with status {status}"
            )));
        }
        let envelope: UserEnvelope = resp.json().await?;
        envelope
            .user
            .token
            .ok_or_else(|| CliError::api_contract("registration response carried no token"))
    }

    /// Create an article and verify the echoed contract.
    ///
    /// Both 200 and 201 are accepted; some backends return either.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, or a
    /// response that does not echo the submitted fields
    pub async fn create_article(&self, token: &str, draft: &ArticleDraft) -> CliResult<ArticleBody> {
        let url = format!("{}/articles", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", auth_header(token))
            .json(&ArticleRequest { article: draft })
            .send()
            .await?;

        let status = resp.status();
        if !matches!(status.as_u16(), 200 | 201) {
            return Err(CliError::api_contract(format!(
                "article creation returned status {status}"
            )));
        }

        let envelope: ArticleEnvelope = resp.json().await?;
        check_contract(draft, &envelope.article)?;
        Ok(envelope.article)
    }
}

/// Conduit uses the `Token` scheme rather than `Bearer`
fn auth_header(token: &str) -> String {
    format!("Token {token}")
}

/// Verify an article response echoes the submitted draft
fn check_contract(draft: &ArticleDraft, article: &ArticleBody) -> CliResult<()> {
    if article.title != draft.title {
        return Err(CliError::api_contract(format!(
            "title mismatch: submitted {:?}, got {:?}",
            draft.title, article.title
        )));
    }
    if article.description != draft.description {
        return Err(CliError::api_contract(format!(
            "description mismatch: submitted {:?}, got {:?}",
            draft.description, article.description
        )));
    }
    for tag in &draft.tag_list {
        if !article.tag_list.contains(tag) {
            return Err(CliError::api_contract(format!(
                "tag {tag:?} missing from response (got {:?})",
                article.tag_list
            )));
        }
    }
    Ok(())
}
