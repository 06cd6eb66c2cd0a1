//! HTTPS callable function client.
//!
//! Speaks the callable wire protocol: `POST {functions_url}/{name}` with
//! `{"data": ...}` and a `{"result": ...}` reply on success.

use crate::error::{AuthError, AuthResult};
use crate::http::{error_detail, summarize_response_body};
use client_config_and_utils::BackendConfig;
use serde_json::{Map, Value};

/// Client for one functions deployment (project + region).
#[derive(Clone)]
pub struct CallableClient {
    http_client: reqwest::Client,
    functions_url: String,
}

impl CallableClient {
    /// `functions_url` is the deployment root, e.g.
    /// `https://asia-northeast3-my-project.cloudfunctions.net`.
    pub fn new(functions_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            functions_url: functions_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.functions_url())
    }

    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.functions_url, name)
    }

    /// Invoke `name` and return the `result` object.
    ///
    /// Errors:
    /// - `Network` when the request fails or the function answers with a
    ///   non-success status
    /// - `InvalidResponse` when the reply is not JSON or carries no `result`
    ///   object
    pub async fn call(&self, name: &str, data: Value) -> AuthResult<Map<String, Value>> {
        let url = self.endpoint(name);

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "data": data }))
            .send()
            .await
            .map_err(AuthError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::transport)?;
        let body_summary = summarize_response_body(&body);

        tracing::debug!(function = name, status = %status, body_summary = %body_summary, "callable responded");

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| body_summary.clone());
            return Err(AuthError::Network(format!(
                "{} returned {}: {}",
                name, status, detail
            )));
        }

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            AuthError::InvalidResponse(format!("{} reply is not JSON: {} ({})", name, e, body_summary))
        })?;

        match payload {
            Value::Object(mut envelope) => match envelope.remove("result") {
                Some(Value::Object(result)) => Ok(result),
                Some(other) => Err(AuthError::InvalidResponse(format!(
                    "{} result is {}, expected an object",
                    name,
                    json_type(&other)
                ))),
                None => Err(AuthError::InvalidResponse(format!(
                    "{} reply has no result field",
                    name
                ))),
            },
            other => Err(AuthError::InvalidResponse(format!(
                "{} reply is {}, expected an object",
                name,
                json_type(&other)
            ))),
        }
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl std::fmt::Debug for CallableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableClient")
            .field("functions_url", &self.functions_url)
            .finish()
    }
}
