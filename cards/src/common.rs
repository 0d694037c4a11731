//! Helpers shared by the card handlers.

use crate::errors::CardError;
use github_api::ApiResponse;
use serde_json::{Value, json};

pub(crate) const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Build the GraphQL request payload the fetcher posts upstream.
pub(crate) fn graphql_request(query: &str, variables: Value) -> Value {
    json!({
        "query": query,
        "variables": variables,
    })
}

/// Reject usernames outside a configured whitelist.
pub(crate) fn check_whitelist(
    whitelist: Option<Vec<String>>,
    username: &str,
) -> Result<(), CardError> {
    match whitelist {
        Some(allowed) if !allowed.iter().any(|entry| entry == username) => {
            Err(CardError::NotWhitelisted)
        }
        _ => Ok(()),
    }
}

/// A resolved upstream response with an error status is the caller's to
/// interpret; for a card that just means the card cannot be rendered.
pub(crate) fn ensure_success(response: &ApiResponse) -> Result<(), CardError> {
    if response.status.is_success() {
        Ok(())
    } else {
        Err(CardError::UpstreamStatus(response.status))
    }
}

pub(crate) fn string_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

/// Defensive count extraction; a missing field renders as zero rather than
/// failing the whole card.
pub(crate) fn count_at(value: &Value, pointer: &str) -> u64 {
    value.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_check_whitelist() {
        assert!(check_whitelist(None, "anyone").is_ok());
        assert!(check_whitelist(Some(vec!["alice".into()]), "alice").is_ok());
        assert!(matches!(
            check_whitelist(Some(vec!["alice".into()]), "mallory"),
            Err(CardError::NotWhitelisted)
        ));
    }

    #[test]
    fn test_ensure_success() {
        let ok = ApiResponse::new(StatusCode::OK, json!({}));
        assert!(ensure_success(&ok).is_ok());

        let missing = ApiResponse::new(StatusCode::NOT_FOUND, json!({}));
        assert!(matches!(
            ensure_success(&missing),
            Err(CardError::UpstreamStatus(StatusCode::NOT_FOUND))
        ));
    }

    #[test]
    fn test_defensive_extraction() {
        let data = json!({"data": {"user": {"followers": {"totalCount": 7}, "name": "Octo"}}});
        assert_eq!(count_at(&data, "/data/user/followers/totalCount"), 7);
        assert_eq!(count_at(&data, "/data/user/following/totalCount"), 0);
        assert_eq!(string_at(&data, "/data/user/name"), Some("Octo"));
        assert_eq!(string_at(&data, "/data/user/login"), None);
    }
}
