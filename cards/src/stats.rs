//! `/` and `/api` — the default stats card.

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

const USER_STATS_QUERY: &str = r"
query userStats($login: String!) {
  user(login: $login) {
    name
    repositories(ownerAffiliations: OWNER) { totalCount }
    followers { totalCount }
    following { totalCount }
    contributionsCollection { totalCommitContributions }
  }
}";

pub struct StatsCard {
    fetcher: Arc<dyn Fetcher>,
}

impl StatsCard {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CardHandler for StatsCard {
    fn name(&self) -> &'static str {
        "stats"
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
        check_whitelist(env.whitelist(), username)?;
        tracing::debug!(username, "rendering stats card");

        let payload = graphql_request(USER_STATS_QUERY, json!({"login": username}));
        let response = retry_request(self.fetcher.as_ref(), &payload, env)
            .await
            .map_err(CardError::from)?;
        ensure_success(&response)?;

        let data = &response.data;
        if data.pointer("/data/user").map(|user| user.is_null()).unwrap_or(true) {
            return Err(CardError::MalformedPayload("no such user").into());
        }

        let name = string_at(data, "/data/user/name").unwrap_or(username);
        let card = Card::new(format!("{name}'s GitHub Stats"))
            .line(format!(
                "Repositories: {}",
                count_at(data, "/data/user/repositories/totalCount")
            ))
            .line(format!(
                "Commits: {}",
                count_at(
                    data,
                    "/data/user/contributionsCollection/totalCommitContributions"
                )
            ))
            .line(format!(
                "Followers: {}",
                count_at(data, "/data/user/followers/totalCount")
            ))
            .line(format!(
                "Following: {}",
                count_at(data, "/data/user/following/totalCount")
            ));

        res.set_header("Content-Type", SVG_CONTENT_TYPE);
        res.send(card.render());
        Ok(())
    }
}
