use github_api::RetryError;
use thiserror::Error;

/// Failures a card handler reports to the router boundary.
#[derive(Error, Debug)]
pub enum CardError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("this username is not whitelisted")]
    NotWhitelisted,

    #[error("this gist is not whitelisted")]
    GistNotWhitelisted,

    #[error(transparent)]
    Upstream(#[from] RetryError),

    #[error("upstream request failed with status {0}")]
    UpstreamStatus(http::StatusCode),

    #[error("unexpected upstream payload: {0}")]
    MalformedPayload(&'static str),
}
