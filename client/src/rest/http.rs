//! `reqwest` transport.

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client as HttpClient, Method};
use serde_json::Value;
use tracing::{debug, error};

use super::Transport;
use crate::config::ClientConfig;
use crate::error::TransportError;

/// One request per call against the configured API base. No retries and
/// no rate-limit tracking.
#[derive(Clone)]
pub struct HttpTransport {
    http: HttpClient,
    base_url: String,
    token: String,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(HttpClient::new(), config)
    }

    /// Reuse an existing `reqwest` client (connection pool, proxy settings).
    pub fn with_client(http: HttpClient, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
            token: config.token.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        debug!(%method, path, "Sending request");

        let mut request = self
            .http
            .request(method.clone(), self.url_for(path))
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .header(USER_AGENT, &self.user_agent);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(%method, path, "Request failed: {}", e);
            TransportError::Connection(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        if !status.is_success() {
            error!(%method, path, status = status.as_u16(), "Request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}
