//! Path routing and the failure boundary around card handlers.

use crate::adapter::{Adapter, full_body};
use crate::errors::GatewayError;
use crate::handler::CardHandler;
use crate::metrics_defs::{REQUESTS_ROUTED, REQUESTS_UNROUTED};
use bytes::Bytes;
use http::{HeaderValue, Request, Response, StatusCode, header};
use http_body_util::combinators::BoxBody;
use shared::env::EnvStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Fallback redirect target for an unrouted root request.
const PROJECT_URL: &str = "https://github.com/anuraghazra/github-readme-stats";

/// Dispatches requests to card handlers and converts every outcome,
/// including handler failures, into a response.
pub struct Gateway {
    routes: HashMap<&'static str, Arc<dyn CardHandler>>,
    store: EnvStore,
}

impl Gateway {
    pub fn new(store: EnvStore) -> Self {
        Self {
            routes: HashMap::new(),
            store,
        }
    }

    /// Register a handler for an exact path.
    pub fn route(mut self, path: &'static str, handler: Arc<dyn CardHandler>) -> Self {
        self.routes.insert(path, handler);
        self
    }

    pub fn env_store(&self) -> &EnvStore {
        &self.store
    }

    /// Handle one request the way an edge worker's `fetch(request, env)`
    /// entry point does. Never fails: every error becomes a response.
    pub async fn fetch<B>(
        &self,
        request: Request<B>,
        env: &HashMap<String, String>,
    ) -> Response<BoxBody<Bytes, GatewayError>> {
        // The host environment applies to every request, routed or not.
        self.store
            .merge(env.iter().map(|(key, value)| (key.clone(), value.clone())));

        let path = normalize_path(request.uri().path());

        match self.routes.get(path.as_str()) {
            Some(handler) => {
                tracing::debug!(handler = handler.name(), %path, "matched route");
                self.invoke(handler.as_ref(), request, env).await
            }
            // Defensive: the table maps the root already, so this branch is
            // only reachable if the default route is ever unregistered.
            None if path == "/" => redirect_response(StatusCode::MOVED_PERMANENTLY, PROJECT_URL),
            None => {
                tracing::warn!(method = %request.method(), %path, "no route matched");
                shared::counter!(REQUESTS_UNROUTED).increment(1);
                plain_response(StatusCode::NOT_FOUND, "Not Found")
            }
        }
    }

    async fn invoke<B>(
        &self,
        handler: &dyn CardHandler,
        request: Request<B>,
        env: &HashMap<String, String>,
    ) -> Response<BoxBody<Bytes, GatewayError>> {
        let (parts, _body) = request.into_parts();
        let mut adapter = Adapter::build(parts, env, &self.store);
        let snapshot = self.store.snapshot();

        shared::counter!(REQUESTS_ROUTED).increment(1);
        let result = handler
            .handle(&adapter.req, &mut adapter.res, &snapshot)
            .await;

        match result {
            Ok(()) => match adapter.finish() {
                Ok(response) => response,
                Err(error) => {
                    tracing::error!(handler = handler.name(), %error, "failed to finalize response");
                    error_image(&error.to_string())
                }
            },
            Err(error) => {
                tracing::error!(handler = handler.name(), %error, "handler failed");
                error_image(&error.to_string())
            }
        }
    }
}

// Strip exactly one trailing slash, except for the root path.
fn normalize_path(path: &str) -> String {
    if path != "/" && path.ends_with('/') {
        path[..path.len() - 1].to_string()
    } else {
        path.to_string()
    }
}

/// Inline SVG shown when a handler fails. Explicit no-cache so the error
/// never sticks in a CDN.
fn error_image(message: &str) -> Response<BoxBody<Bytes, GatewayError>> {
    let message = if message.is_empty() {
        "Internal server error"
    } else {
        message
    };
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="120">
  <text x="10" y="30" font-family="monospace" font-size="14" fill="#ff0000">
    Error: {}
  </text>
</svg>"#,
        escape_text(message)
    );

    let mut response = Response::new(full_body(svg));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("image/svg+xml"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    response
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn plain_response(
    status: StatusCode,
    body: &'static str,
) -> Response<BoxBody<Bytes, GatewayError>> {
    let mut response = Response::new(full_body(body));
    *response.status_mut() = status;
    response
}

fn redirect_response(
    status: StatusCode,
    target: &'static str,
) -> Response<BoxBody<Bytes, GatewayError>> {
    let mut response = Response::new(full_body(Bytes::new()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_static(target));
    response
}
