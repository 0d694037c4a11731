//! Serverless-style request/response shims.
//!
//! The card handlers are written against a mutable `(req, res)` pair in the
//! manner of a classic Node server. These shims reproduce that surface over
//! immutable `http` types: the request is parsed once into plain maps, the
//! response accumulates status, headers, and body until a terminal write
//! marks it sent, and [`Adapter::finish`] turns the result back into a real
//! response.

use crate::errors::GatewayError;
use bytes::Bytes;
use http::request::Parts;
use http::{HeaderValue, Method, Response, StatusCode, header};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use indexmap::IndexMap;
use serde::Serialize;
use shared::env::EnvStore;
use std::collections::HashMap;

/// Body accumulated by a [`WorkerResponse`].
#[derive(Clone, Debug, PartialEq)]
pub enum ShimBody {
    Text(String),
    Binary(Bytes),
}

impl ShimBody {
    fn into_bytes(self) -> Bytes {
        match self {
            ShimBody::Text(text) => Bytes::from(text),
            ShimBody::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for ShimBody {
    fn from(text: String) -> Self {
        ShimBody::Text(text)
    }
}

impl From<&str> for ShimBody {
    fn from(text: &str) -> Self {
        ShimBody::Text(text.to_string())
    }
}

impl From<Bytes> for ShimBody {
    fn from(bytes: Bytes) -> Self {
        ShimBody::Binary(bytes)
    }
}

impl From<Vec<u8>> for ShimBody {
    fn from(bytes: Vec<u8>) -> Self {
        ShimBody::Binary(Bytes::from(bytes))
    }
}

/// Read-only view of an incoming request, built once per request.
pub struct WorkerRequest {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    parts: Parts,
}

impl WorkerRequest {
    pub fn new(parts: Parts) -> Self {
        let path = parts.uri.path();
        let raw_query = parts.uri.query();
        let url = match raw_query {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };

        // Last value wins for repeated keys, standard query-string semantics.
        let mut query = HashMap::new();
        if let Some(raw) = raw_query {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                query.insert(key.into_owned(), value.into_owned());
            }
        }

        let mut headers = HashMap::new();
        for (name, value) in parts.headers.iter() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        Self {
            method: parts.method.clone(),
            url,
            headers,
            query,
            parts,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// `path?query` of the original URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// One query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The untouched parts of the original request.
    pub fn original(&self) -> &Parts {
        &self.parts
    }
}

/// Mutable response accumulator handlers write into.
///
/// Header keys keep the exact case and order the handler set; `sent` flips
/// on the first terminal write and never reverts.
pub struct WorkerResponse {
    status: StatusCode,
    headers: IndexMap<String, String>,
    body: Option<ShimBody>,
    sent: bool,
}

impl Default for WorkerResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: IndexMap::new(),
            body: None,
            sent: false,
        }
    }

    /// Store a header, overwriting any prior value for that exact key.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn status(&mut self, code: StatusCode) -> &mut Self {
        self.status = code;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn sent(&self) -> bool {
        self.sent
    }

    pub fn body(&self) -> Option<&ShimBody> {
        self.body.as_ref()
    }

    /// Terminal write: store `data` verbatim.
    pub fn send(&mut self, data: impl Into<ShimBody>) -> &mut Self {
        self.body = Some(data.into());
        self.sent = true;
        self
    }

    /// Terminal write: serialize `data` as the JSON body.
    pub fn json<T: Serialize>(&mut self, data: &T) -> Result<&mut Self, GatewayError> {
        let body = serde_json::to_string(data)?;
        self.set_header("Content-Type", "application/json");
        self.body = Some(ShimBody::Text(body));
        self.sent = true;
        Ok(self)
    }

    /// Terminal write: 302 redirect to `target`.
    pub fn redirect(&mut self, target: &str) -> &mut Self {
        self.redirect_with_status(StatusCode::FOUND, target)
    }

    /// Terminal write: redirect with an explicit status code.
    pub fn redirect_with_status(&mut self, status: StatusCode, target: &str) -> &mut Self {
        self.status = status;
        self.set_header("Location", target);
        self.sent = true;
        self
    }
}

/// One request's shim pair.
pub struct Adapter {
    pub req: WorkerRequest,
    pub res: WorkerResponse,
}

impl Adapter {
    /// Build the shim pair and fold the host-supplied variables into the
    /// shared store (key-by-key overwrite).
    pub fn build(parts: Parts, env: &HashMap<String, String>, store: &EnvStore) -> Self {
        store.merge(env.iter().map(|(key, value)| (key.clone(), value.clone())));
        Self {
            req: WorkerRequest::new(parts),
            res: WorkerResponse::new(),
        }
    }

    /// Convert the accumulated shim into an outgoing response.
    ///
    /// A handler that returned without a terminal write yields a fixed 500
    /// diagnostic instead of an empty 200.
    pub fn finish(self) -> Result<Response<BoxBody<Bytes, GatewayError>>, GatewayError> {
        finish_response(self.res)
    }
}

pub(crate) fn finish_response(
    res: WorkerResponse,
) -> Result<Response<BoxBody<Bytes, GatewayError>>, GatewayError> {
    if !res.sent {
        let mut response = Response::new(full_body("Internal Server Error: No response sent"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        return Ok(response);
    }

    let body = match res.body {
        Some(body) => body.into_bytes(),
        None => Bytes::new(),
    };

    let mut response = Response::new(full_body(body));
    *response.status_mut() = res.status;
    for (name, value) in &res.headers {
        let name = header::HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        response.headers_mut().insert(name, value);
    }

    Ok(response)
}

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody<Bytes, GatewayError> {
    Full::new(data.into()).map_err(|e| match e {}).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    fn parts_for(uri: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("X-Custom", "custom-value")
            .header("Accept", "image/svg+xml")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    async fn body_text(response: Response<BoxBody<Bytes, GatewayError>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_request_shim_query_last_value_wins() {
        let req = WorkerRequest::new(parts_for("/api/top-langs?username=foo&username=bar"));
        assert_eq!(req.param("username"), Some("bar"));
        assert_eq!(req.url(), "/api/top-langs?username=foo&username=bar");
        assert_eq!(req.method(), &Method::GET);
    }

    #[test]
    fn test_request_shim_header_lookup_is_case_insensitive() {
        let req = WorkerRequest::new(parts_for("/api"));
        assert_eq!(req.header("x-custom"), Some("custom-value"));
        assert_eq!(req.header("X-CUSTOM"), Some("custom-value"));
        assert_eq!(req.header("Accept"), Some("image/svg+xml"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn test_request_shim_decodes_query_values() {
        let req = WorkerRequest::new(parts_for("/api?username=a%20b&show_icons=true"));
        assert_eq!(req.param("username"), Some("a b"));
        assert_eq!(req.param("show_icons"), Some("true"));
        assert_eq!(req.param("absent"), None);
    }

    #[test]
    fn test_response_shim_defaults() {
        let res = WorkerResponse::new();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(!res.sent());
        assert!(res.body().is_none());
    }

    #[test]
    fn test_response_shim_set_header_overwrites_exact_key() {
        let mut res = WorkerResponse::new();
        res.set_header("Cache-Control", "no-cache");
        res.set_header("Cache-Control", "public, max-age=60");
        assert_eq!(res.get_header("Cache-Control"), Some("public, max-age=60"));
        // Key lookup on the shim is exact-case, like a plain object.
        assert_eq!(res.get_header("cache-control"), None);
    }

    #[test]
    fn test_response_shim_send_marks_sent() {
        let mut res = WorkerResponse::new();
        res.status(StatusCode::CREATED).send("payload");
        assert!(res.sent());
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.body(), Some(&ShimBody::Text("payload".into())));
    }

    #[test]
    fn test_response_shim_json_round_trip() {
        let mut res = WorkerResponse::new();
        res.json(&json!({"a": 1})).unwrap();

        assert!(res.sent());
        assert_eq!(res.get_header("Content-Type"), Some("application/json"));
        let Some(ShimBody::Text(body)) = res.body() else {
            panic!("expected text body");
        };
        let parsed: Value = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn test_response_shim_redirect_forms() {
        let mut res = WorkerResponse::new();
        res.redirect("/x");
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.get_header("Location"), Some("/x"));
        assert!(res.sent());

        let mut res = WorkerResponse::new();
        res.redirect_with_status(StatusCode::MOVED_PERMANENTLY, "/y");
        assert_eq!(res.status_code(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.get_header("Location"), Some("/y"));
        assert!(res.sent());
    }

    #[tokio::test]
    async fn test_finish_without_terminal_write_is_a_500_diagnostic() {
        let res = WorkerResponse::new();
        let response = finish_response(res).unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert_eq!(
            body_text(response).await,
            "Internal Server Error: No response sent"
        );
    }

    #[tokio::test]
    async fn test_finish_copies_status_headers_and_body() {
        let mut res = WorkerResponse::new();
        res.status(StatusCode::ACCEPTED)
            .set_header("X-Card", "stats")
            .set_header("Content-Type", "image/svg+xml");
        res.send("<svg/>");

        let response = finish_response(res).unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers().get("x-card").unwrap(), "stats");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );
        assert_eq!(body_text(response).await, "<svg/>");
    }

    #[tokio::test]
    async fn test_finish_passes_binary_bodies_through() {
        let mut res = WorkerResponse::new();
        res.send(vec![0u8, 159, 146, 150]);

        let response = finish_response(res).unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), &[0u8, 159, 146, 150]);
    }

    #[test]
    fn test_adapter_build_merges_env_into_store() {
        let store = EnvStore::new();
        store.merge([("PAT_1", "seeded")]);

        let env: HashMap<String, String> = [
            ("PAT_1".to_string(), "overridden".to_string()),
            ("WHITELIST".to_string(), "alice".to_string()),
        ]
        .into_iter()
        .collect();

        let adapter = Adapter::build(parts_for("/api?username=alice"), &env, &store);
        assert_eq!(adapter.req.param("username"), Some("alice"));
        assert!(!adapter.res.sent());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("PAT_1"), Some("overridden"));
        assert_eq!(snapshot.get("WHITELIST"), Some("alice"));
    }
}
