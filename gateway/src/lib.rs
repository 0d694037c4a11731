pub mod adapter;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod router;

pub use errors::GatewayError;
pub use handler::{CardHandler, HandlerError};
pub use router::Gateway;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response};
use shared::http::run_http_service;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

/// Serve `gateway` on `host:port`, handing it `env` on every request the
/// way an edge host supplies its environment to `fetch(request, env)`.
pub async fn run(
    host: &str,
    port: u16,
    gateway: Gateway,
    env: HashMap<String, String>,
) -> Result<(), GatewayError> {
    let service = GatewayService {
        gateway: Arc::new(gateway),
        env: Arc::new(env),
    };
    run_http_service(host, port, service).await
}

struct GatewayService {
    gateway: Arc<Gateway>,
    env: Arc<HashMap<String, String>>,
}

impl Service<Request<Incoming>> for GatewayService {
    type Response = Response<BoxBody<Bytes, GatewayError>>;
    type Error = GatewayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let gateway = self.gateway.clone();
        let env = self.env.clone();
        Box::pin(async move { Ok(gateway.fetch(req, &env).await) })
    }
}
