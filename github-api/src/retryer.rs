//! Token rotation against upstream rate limits.

use crate::fetch::{ApiResponse, FetchError, Fetcher};
use crate::metrics_defs::{RETRY_EXHAUSTIONS, TOKEN_ROTATIONS};
use crate::tokens;
use serde_json::Value;
use shared::env::Env;

/// Terminal outcomes of [`retry_request`] once rotation cannot continue.
#[derive(thiserror::Error, Debug)]
pub enum RetryError {
    #[error("no GitHub API tokens found")]
    NoCredentials,
    #[error("downtime due to GitHub API rate limiting")]
    RetryBudgetExhausted,
    /// The fetcher failed without an upstream response; handed back to the
    /// caller untouched.
    #[error(transparent)]
    Network(FetchError),
}

/// Call `fetcher` with successive tokens until it succeeds, the budget is
/// exhausted, or it fails in a way rotation cannot help.
///
/// Attempt `n` uses the 1-based token `PAT_{n+1}`. A rate-limited response
/// or a revoked-credential failure advances to the next token; a network
/// failure propagates untouched; any other upstream error response resolves
/// as `Ok` for the caller to interpret.
pub async fn retry_request<F>(
    fetcher: &F,
    variables: &Value,
    env: &Env,
) -> Result<ApiResponse, RetryError>
where
    F: Fetcher + ?Sized,
{
    let budget = tokens::retry_budget(env);
    if budget == 0 {
        return Err(RetryError::NoCredentials);
    }

    let mut attempt = 0;
    loop {
        if attempt > budget {
            shared::counter!(RETRY_EXHAUSTIONS).increment(1);
            return Err(RetryError::RetryBudgetExhausted);
        }

        let token = tokens::pat(env, attempt + 1);
        match fetcher.fetch(variables, token, attempt).await {
            Ok(response) if response.is_rate_limited() => attempt = rotate(attempt),
            Ok(response) => return Ok(response),
            Err(FetchError::Status(response)) if response.is_credential_revoked() => {
                attempt = rotate(attempt);
            }
            // Upstream answered with some other error; the caller decides
            // what to make of the status and body.
            Err(FetchError::Status(response)) => return Ok(response),
            Err(network @ FetchError::Network(_)) => return Err(RetryError::Network(network)),
        }
    }
}

fn rotate(attempt: u32) -> u32 {
    tracing::warn!("PAT_{} failed", attempt + 1);
    shared::counter!(TOKEN_ROTATIONS).increment(1);
    attempt + 1
}
