//! `/api/top-langs` — most-used languages card.

use crate::common::{SVG_CONTENT_TYPE, check_whitelist, ensure_success, graphql_request};
use crate::errors::CardError;
use crate::render::Card;
use async_trait::async_trait;
use gateway::adapter::{WorkerRequest, WorkerResponse};
use gateway::handler::{CardHandler, HandlerError};
use github_api::{Fetcher, retry_request};
use serde_json::{Value, json};
use shared::env::Env;
use std::collections::HashMap;
use std::sync::Arc;

const TOP_LANGS_QUERY: &str = r"
query topLanguages($login: String!) {
  user(login: $login) {
    repositories(ownerAffiliations: OWNER, first: 100) {
      nodes {
        name
        languages(first: 10, orderBy: {field: SIZE, direction: DESC}) {
          edges {
            size
            node { name }
          }
        }
      }
    }
  }
}";

const TOP_LANGS_COUNT: usize = 5;

pub struct TopLangsCard {
    fetcher: Arc<dyn Fetcher>,
}

impl TopLangsCard {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CardHandler for TopLangsCard {
    fn name(&self) -> &'static str {
        "top-langs"
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

        let payload = graphql_request(TOP_LANGS_QUERY, json!({"login": username}));
        let response = retry_request(self.fetcher.as_ref(), &payload, env)
            .await
            .map_err(CardError::from)?;
        ensure_success(&response)?;

        let ranked = aggregate_languages(&response.data, &env.exclude_repositories());
        let total: u64 = ranked.iter().map(|(_, size)| size).sum();

        let mut card = Card::new(format!("{username}'s Most Used Languages"));
        if ranked.is_empty() {
            card = card.line("No language data available");
        }
        for (language, size) in &ranked {
            let share = if total > 0 { size * 100 / total } else { 0 };
            card = card.line(format!("{language}: {share}%"));
        }

        res.set_header("Content-Type", SVG_CONTENT_TYPE);
        res.send(card.render());
        Ok(())
    }
}

/// Sum language sizes across repositories, skipping excluded repositories,
/// and keep the largest few.
fn aggregate_languages(data: &Value, excluded: &[String]) -> Vec<(String, u64)> {
    let repos = data
        .pointer("/data/user/repositories/nodes")
        .and_then(Value::as_array);

    let mut totals: HashMap<String, u64> = HashMap::new();
    for repo in repos.into_iter().flatten() {
        let repo_name = repo.get("name").and_then(Value::as_str).unwrap_or_default();
        if excluded.iter().any(|entry| entry == repo_name) {
            continue;
        }

        let edges = repo.pointer("/languages/edges").and_then(Value::as_array);
        for edge in edges.into_iter().flatten() {
            let size = edge.get("size").and_then(Value::as_u64).unwrap_or(0);
            if let Some(language) = edge.pointer("/node/name").and_then(Value::as_str) {
                *totals.entry(language.to_string()).or_insert(0) += size;
            }
        }
    }

    let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
    // Sort by size; ties break on the name so the output is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_LANGS_COUNT);
    ranked
}
