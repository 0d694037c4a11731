//! `/api/pin` — pinned repository card.

use crate::common::{SVG_CONTENT_TYPE, check_whitelist, count_at, ensure_success, graphql_request, string_at};
use crate::errors::CardError;
use crate::render::Card;
use async_trait::async_trait;
use gateway::adapter::{WorkerRequest, WorkerResponse};
use gateway::handler::{CardHandler, HandlerError};
use github_api::{Fetcher, retry_request};
use serde_json::json;
use shared::env::Env;
use std::sync::Arc;

const REPO_QUERY: &str = r"
query repoPin($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    name
    description
    stargazerCount
    forkCount
    primaryLanguage { name }
  }
}";

pub struct PinCard {
    fetcher: Arc<dyn Fetcher>,
}

impl PinCard {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CardHandler for PinCard {
    fn name(&self) -> &'static str {
        "pin"
    }

    async fn handle(
        &self,
        req: &WorkerRequest,
        res: &mut WorkerResponse,
        env: &Env,
    ) -> Result<(), HandlerError> {
        let username = req
            .param("username")
            .ok_or(CardError::MissingParameter("username"))?;
        let repo = req.param("repo").ok_or(CardError::MissingParameter("repo"))?;
        check_whitelist(env.whitelist(), username)?;

        let payload = graphql_request(REPO_QUERY, json!({"owner": username, "repo": repo}));
        let response = retry_request(self.fetcher.as_ref(), &payload, env)
            .await
            .map_err(CardError::from)?;
        ensure_success(&response)?;

        let data = &response.data;
        if data
            .pointer("/data/repository")
            .map(|repository| repository.is_null())
            .unwrap_or(true)
        {
            return Err(CardError::MalformedPayload("no such repository").into());
        }

        let description = string_at(data, "/data/repository/description")
            .unwrap_or("No description provided");
        let language =
            string_at(data, "/data/repository/primaryLanguage/name").unwrap_or("Unknown");

        let card = Card::new(format!("{username}/{repo}"))
            .line(description.to_string())
            .line(format!(
                "Stars: {}  Forks: {}",
                count_at(data, "/data/repository/stargazerCount"),
                count_at(data, "/data/repository/forkCount")
            ))
            .line(format!("Language: {language}"));

        res.set_header("Content-Type", SVG_CONTENT_TYPE);
        res.send(card.render());
        Ok(())
    }
}
