pub mod env;
pub mod http;
pub mod metrics_defs;
