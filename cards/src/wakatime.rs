//! `/api/wakatime` — coding activity card.
//!
//! The WakaTime stats endpoint is public, so the fetcher is called directly
//! rather than through the token-rotating retryer.

use crate::common::{SVG_CONTENT_TYPE, ensure_success, string_at};
use crate::errors::CardError;
use crate::render::Card;
use async_trait::async_trait;
use gateway::adapter::{WorkerRequest, WorkerResponse};
use gateway::handler::{CardHandler, HandlerError};
use github_api::{FetchError, Fetcher};
use serde_json::{Value, json};
use shared::env::Env;
use std::sync::Arc;

const TOP_LANGS_COUNT: usize = 3;

pub struct WakaTimeCard {
    fetcher: Arc<dyn Fetcher>,
}

impl WakaTimeCard {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CardHandler for WakaTimeCard {
    fn name(&self) -> &'static str {
        "wakatime"
    }

    async fn handle(
        &self,
        req: &WorkerRequest,
        res: &mut WorkerResponse,
        _env: &Env,
    ) -> Result<(), HandlerError> {
        let username = req
            .param("username")
            .ok_or(CardError::MissingParameter("username"))?;

        let variables = json!({"username": username});
        let response = match self.fetcher.fetch(&variables, None, 0).await {
            Ok(response) => response,
            Err(FetchError::Status(response)) => response,
            Err(network) => return Err(network.into()),
        };
        ensure_success(&response)?;

        let data = &response.data;
        let total = string_at(data, "/data/human_readable_total").unwrap_or("0 hrs");
        let daily = string_at(data, "/data/human_readable_daily_average").unwrap_or("0 hrs");

        let mut card = Card::new(format!("{username}'s WakaTime Stats"))
            .line(format!("Total: {total}"))
            .line(format!("Daily Average: {daily}"));

        let languages = data
            .pointer("/data/languages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for language in languages.iter().take(TOP_LANGS_COUNT) {
            let name = language.get("name").and_then(Value::as_str).unwrap_or("?");
            let percent = language
                .get("percent")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            card = card.line(format!("{name}: {percent:.1}%"));
        }

        res.set_header("Content-Type", SVG_CONTENT_TYPE);
        res.send(card.render());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FixedFetcher, shim_request};
    use gateway::adapter::ShimBody;
    use http::StatusCode;

    fn waka_body() -> Value {
        json!({
            "data": {
                "human_readable_total": "41 hrs 12 mins",
                "human_readable_daily_average": "5 hrs 53 mins",
                "languages": [
                    {"name": "Rust", "percent": 62.5},
                    {"name": "TOML", "percent": 20.0},
                    {"name": "Markdown", "percent": 10.5},
                    {"name": "Shell", "percent": 7.0}
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_renders_wakatime_card() {
        let handler = WakaTimeCard::new(Arc::new(FixedFetcher::ok(waka_body())));
        let req = shim_request("/api/wakatime?username=alice");
        let mut res = WorkerResponse::new();

        handler.handle(&req, &mut res, &Env::default()).await.unwrap();

        let Some(ShimBody::Text(svg)) = res.body() else {
            panic!("expected text body");
        };
        assert!(svg.contains("Total: 41 hrs 12 mins"));
        assert!(svg.contains("Rust: 62.5%"));
        // Only the top three languages are shown.
        assert!(!svg.contains("Shell"));
    }

    #[tokio::test]
    async fn test_username_is_required() {
        let handler = WakaTimeCard::new(Arc::new(FixedFetcher::ok(waka_body())));
        let mut res = WorkerResponse::new();

        let error = handler
            .handle(&shim_request("/api/wakatime"), &mut res, &Env::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("username"));
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_surfaced() {
        let handler = WakaTimeCard::new(Arc::new(FixedFetcher::with_status(
            StatusCode::NOT_FOUND,
            json!({"error": "Not found"}),
        )));
        let req = shim_request("/api/wakatime?username=ghost");
        let mut res = WorkerResponse::new();

        let error = handler
            .handle(&req, &mut res, &Env::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("404"));
    }
}
