//! Shared helpers for the backend REST calls.

use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Length and digest of a response body, safe to log.
pub(crate) fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Pull `error.status` / `error.message` out of a backend error body.
///
/// Backend error codes (`INVALID_ID_TOKEN`, `INTERNAL`, ...) carry no secrets.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match (envelope.error.status, envelope.error.message) {
        (Some(status), Some(message)) if status != message => {
            Some(format!("{}: {}", status, message))
        }
        (Some(status), _) => Some(status),
        (None, Some(message)) => Some(message),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_hides_body() {
        let body = r#"{"customToken":"secret"}"#;
        let summary = summarize_response_body(body);
        assert!(summary.starts_with(&format!("len={},digest=", body.len())));
        assert!(!summary.contains("secret"));
    }

    #[test]
    fn test_error_detail_variants() {
        assert_eq!(
            error_detail(r#"{"error":{"status":"INTERNAL","message":"boom"}}"#).as_deref(),
            Some("INTERNAL: boom")
        );
        assert_eq!(
            error_detail(r#"{"error":{"code":400,"message":"INVALID_CUSTOM_TOKEN"}}"#).as_deref(),
            Some("INVALID_CUSTOM_TOKEN")
        );
        assert_eq!(error_detail("<html>502</html>"), None);
    }
}
