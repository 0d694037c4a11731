pub mod fetch;
pub mod metrics_defs;
pub mod retryer;
pub mod tokens;

pub use fetch::{ApiResponse, FetchError, Fetcher, GraphQlFetcher, WakaTimeFetcher};
pub use retryer::{RetryError, retry_request};
