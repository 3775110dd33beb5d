//! HTTP transport: builds `{base}/bot{token}/{method}` requests and maps the
//! response envelope onto the error taxonomy.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use tbot_core::{BotError, Result};

/// Request payload for one method call: JSON form fields or a multipart
/// upload.
pub enum RequestBody {
    Form(Value),
    Multipart(reqwest::multipart::Form),
}

/// Executes one Bot API method call. The engine never sees this boundary;
/// [`crate::Api`] builds method payloads on top of it. Fails with `Network`
/// when the call itself errors, `Api` when the remote answers `ok: false`,
/// and `NotFound` on a 404 status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, method: &str, body: RequestBody) -> Result<Value>;
}

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl HttpTransport {
    pub fn new(token: &str, api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base, self.token, method)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, method: &str, body: RequestBody) -> Result<Value> {
        debug!(method, "api call");
        let request = self.http.post(self.method_url(method));
        let request = match body {
            RequestBody::Form(form) => request.json(&form),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BotError::NotFound(method.to_string()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let code = body.get("error_code").and_then(Value::as_i64).unwrap_or(0);
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("request rejected")
                .to_string();
            return Err(BotError::Api { code, description });
        }
        Ok(body)
    }
}
