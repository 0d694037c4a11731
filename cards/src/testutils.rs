use async_trait::async_trait;
use gateway::adapter::WorkerRequest;
use github_api::{ApiResponse, FetchError, Fetcher};
use http::{Request, StatusCode};
use serde_json::Value;
use shared::env::Env;

/// Fetcher that replays one canned response for every call.
pub(crate) struct FixedFetcher {
    status: StatusCode,
    body: Value,
}

impl FixedFetcher {
    pub(crate) fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub(crate) fn with_status(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }
}

#[async_trait]
impl Fetcher for FixedFetcher {
    async fn fetch(
        &self,
        _variables: &Value,
        _token: Option<&str>,
        _attempt: u32,
    ) -> Result<ApiResponse, FetchError> {
        let response = ApiResponse::new(self.status, self.body.clone());
        if self.status.is_success() {
            Ok(response)
        } else {
            Err(FetchError::Status(response))
        }
    }
}

pub(crate) fn shim_request(uri: &str) -> WorkerRequest {
    let (parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
    WorkerRequest::new(parts)
}

pub(crate) fn env_with_pat() -> Env {
    [("PAT_1", "token")].into_iter().collect()
}
