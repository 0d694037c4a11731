//! `/api/gist` — pinned gist card.

use crate::common::{SVG_CONTENT_TYPE, count_at, ensure_success, graphql_request, string_at};
use crate::errors::CardError;
use crate::render::Card;
use async_trait::async_trait;
use gateway::adapter::{WorkerRequest, WorkerResponse};
use gateway::handler::{CardHandler, HandlerError};
use github_api::{Fetcher, retry_request};
use serde_json::json;
use shared::env::Env;
use std::sync::Arc;

const GIST_QUERY: &str = r"
query gistInfo($gistName: String!) {
  viewer {
    gist(name: $gistName) {
      description
      stargazerCount
      forks { totalCount }
      files { name language { name } }
      owner { login }
    }
  }
}";

pub struct GistCard {
    fetcher: Arc<dyn Fetcher>,
}

impl GistCard {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CardHandler for GistCard {
    fn name(&self) -> &'static str {
        "gist"
    }

    async fn handle(
        &self,
        req: &WorkerRequest,
        res: &mut WorkerResponse,
        env: &Env,
    ) -> Result<(), HandlerError> {
        let id = req.param("id").ok_or(CardError::MissingParameter("id"))?;

        let payload = graphql_request(GIST_QUERY, json!({"gistName": id}));
        let response = retry_request(self.fetcher.as_ref(), &payload, env)
            .await
            .map_err(CardError::from)?;
        ensure_success(&response)?;

        let data = &response.data;
        if data
            .pointer("/data/viewer/gist")
            .map(|gist| gist.is_null())
            .unwrap_or(true)
        {
            return Err(CardError::MalformedPayload("no such gist").into());
        }

        // The gist whitelist is keyed on the owning account.
        let owner = string_at(data, "/data/viewer/gist/owner/login").unwrap_or_default();
        if let Some(allowed) = env.gist_whitelist()
            && !allowed.iter().any(|entry| entry == owner)
        {
            return Err(CardError::GistNotWhitelisted.into());
        }

        let description =
            string_at(data, "/data/viewer/gist/description").unwrap_or("No description provided");
        let first_file = string_at(data, "/data/viewer/gist/files/0/name").unwrap_or(id);
        let language =
            string_at(data, "/data/viewer/gist/files/0/language/name").unwrap_or("Unknown");

        let card = Card::new(first_file)
            .line(description.to_string())
            .line(format!(
                "Stars: {}  Forks: {}",
                count_at(data, "/data/viewer/gist/stargazerCount"),
                count_at(data, "/data/viewer/gist/forks/totalCount")
            ))
            .line(format!("Language: {language}"));

        res.set_header("Content-Type", SVG_CONTENT_TYPE);
        res.send(card.render());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FixedFetcher, env_with_pat, shim_request};
    use gateway::adapter::ShimBody;
    use serde_json::Value;

    fn gist_body() -> Value {
        json!({
            "data": {
                "viewer": {
                    "gist": {
                        "description": "Deploy script",
                        "stargazerCount": 12,
                        "forks": {"totalCount": 3},
                        "files": [{"name": "deploy.sh", "language": {"name": "Shell"}}],
                        "owner": {"login": "alice"}
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_renders_gist_card() {
        let handler = GistCard::new(Arc::new(FixedFetcher::ok(gist_body())));
        let req = shim_request("/api/gist?id=abc123");
        let mut res = WorkerResponse::new();

        handler.handle(&req, &mut res, &env_with_pat()).await.unwrap();

        let Some(ShimBody::Text(svg)) = res.body() else {
            panic!("expected text body");
        };
        assert!(svg.contains("deploy.sh"));
        assert!(svg.contains("Deploy script"));
        assert!(svg.contains("Stars: 12  Forks: 3"));
    }

    #[tokio::test]
    async fn test_id_is_required() {
        let handler = GistCard::new(Arc::new(FixedFetcher::ok(gist_body())));
        let mut res = WorkerResponse::new();

        let error = handler
            .handle(&shim_request("/api/gist"), &mut res, &env_with_pat())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("id"));
    }

    #[tokio::test]
    async fn test_gist_whitelist_checks_owner() {
        let handler = GistCard::new(Arc::new(FixedFetcher::ok(gist_body())));
        let req = shim_request("/api/gist?id=abc123");

        let mut res = WorkerResponse::new();
        let env: Env = [("PAT_1", "token"), ("GIST_WHITELIST", "alice,bob")]
            .into_iter()
            .collect();
        handler.handle(&req, &mut res, &env).await.unwrap();
        assert!(res.sent());

        let mut res = WorkerResponse::new();
        let env: Env = [("PAT_1", "token"), ("GIST_WHITELIST", "carol")]
            .into_iter()
            .collect();
        let error = handler.handle(&req, &mut res, &env).await.unwrap_err();
        assert!(
            error
                .downcast_ref::<CardError>()
                .is_some_and(|e| matches!(e, CardError::GistNotWhitelisted))
        );
    }

    #[tokio::test]
    async fn test_missing_gist_is_an_error() {
        let handler = GistCard::new(Arc::new(FixedFetcher::ok(
            json!({"data": {"viewer": {"gist": null}}}),
        )));
        let req = shim_request("/api/gist?id=gone");
        let mut res = WorkerResponse::new();

        let error = handler
            .handle(&req, &mut res, &env_with_pat())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("no such gist"));
    }
}
