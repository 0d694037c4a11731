//! Upstream API calls.

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const WAKATIME_STATS_URL: &str = "https://wakatime.com/api/v1/users";
const USER_AGENT: &str = "cardgate";

/// A collected upstream response: status plus parsed JSON body.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub data: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, data: Value) -> Self {
        Self { status, data }
    }

    /// Whether the response reports upstream rate limiting.
    ///
    /// GitHub signals this either as a typed GraphQL error or as a plain
    /// message mentioning the rate limit; both forms must rotate the token.
    pub fn is_rate_limited(&self) -> bool {
        let Some(first) = self.first_error() else {
            return false;
        };
        if first.get("type").and_then(Value::as_str) == Some("RATE_LIMITED") {
            return true;
        }
        first
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|message| message.to_ascii_lowercase().contains("rate limit"))
    }

    /// Whether the response reports an invalidated or suspended credential.
    pub fn is_credential_revoked(&self) -> bool {
        matches!(
            self.message(),
            Some("Bad credentials") | Some("Sorry. Your account was suspended.")
        )
    }

    /// The REST-style top-level `message` field.
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }

    // First entry of the GraphQL `errors` list, if any.
    fn first_error(&self) -> Option<&Value> {
        self.data
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
    }
}

/// Errors produced by a [`Fetcher`].
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The call never produced an upstream response (connect, DNS, decode).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The upstream answered with a non-success status; the body is kept so
    /// the caller can inspect it.
    #[error("upstream returned {}", .0.status)]
    Status(ApiResponse),
}

impl From<reqwest::Error> for FetchError {
    fn from(source: reqwest::Error) -> Self {
        FetchError::Network(Box::new(source))
    }
}

/// One upstream call attempt.
///
/// The token is the credential selected for this attempt, absent when the
/// retry budget outruns the configured tokens. The attempt number is passed
/// through so test fetchers can simulate rate limiting on early attempts.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        variables: &Value,
        token: Option<&str>,
        attempt: u32,
    ) -> Result<ApiResponse, FetchError>;
}

/// Fetcher for the GitHub GraphQL API.
pub struct GraphQlFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphQlFetcher {
    pub fn new() -> Self {
        Self::with_endpoint(GITHUB_GRAPHQL_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for GraphQlFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for GraphQlFetcher {
    async fn fetch(
        &self,
        variables: &Value,
        token: Option<&str>,
        _attempt: u32,
    ) -> Result<ApiResponse, FetchError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(variables);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let data = response.json::<Value>().await?;

        let response = ApiResponse::new(status, data);
        if !status.is_success() {
            return Err(FetchError::Status(response));
        }
        Ok(response)
    }
}

/// Fetcher for the public WakaTime stats API.
///
/// The endpoint is not token-gated, so the credential and attempt inputs are
/// ignored.
pub struct WakaTimeFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl WakaTimeFetcher {
    pub fn new() -> Self {
        Self::with_base_url(WAKATIME_STATS_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for WakaTimeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for WakaTimeFetcher {
    async fn fetch(
        &self,
        variables: &Value,
        _token: Option<&str>,
        _attempt: u32,
    ) -> Result<ApiResponse, FetchError> {
        let username = variables
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let url = format!("{}/{}/stats?is_including_today=true", self.base_url, username);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;
        let status = response.status();
        let data = response.json::<Value>().await?;

        let response = ApiResponse::new(status, data);
        if !status.is_success() {
            return Err(FetchError::Status(response));
        }
        Ok(response)
    }
}
