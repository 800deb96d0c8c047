//! HTTP client for the Semaphore API.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ServerSettings;
use crate::error::{Error, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Timeout for task submission and project backup export.
pub const LONG_TIMEOUT_SECS: u64 = 120;

/// Client for one Semaphore server.
///
/// Certificate verification is disabled: the tool talks to self-signed
/// internal endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Builds a client from the `[server]` settings.
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Request(e.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        })
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET returning parsed JSON (or raw text wrapped in a JSON string).
    pub async fn get(&self, path: &str) -> Result<Value> {
        let resp = self.request(Method::GET, path, None, None).await?;
        parse_body(resp).await
    }

    /// GET returning the raw response body.
    pub async fn get_raw(&self, path: &str) -> Result<String> {
        let resp = self.request(Method::GET, path, None, None).await?;
        resp.text().await.map_err(|e| Error::Request(e.to_string()))
    }

    /// POST with an optional JSON body.
    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        let resp = self.request(Method::POST, path, body, None).await?;
        parse_body(resp).await
    }

    /// POST with the long timeout, for task submission.
    pub async fn post_slow(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        let timeout = Duration::from_secs(LONG_TIMEOUT_SECS);
        let resp = self.request(Method::POST, path, body, Some(timeout)).await?;
        parse_body(resp).await
    }

    /// GET with the long timeout, for project backup export.
    pub async fn get_slow(&self, path: &str) -> Result<Value> {
        let timeout = Duration::from_secs(LONG_TIMEOUT_SECS);
        let resp = self.request(Method::GET, path, None, Some(timeout)).await?;
        parse_body(resp).await
    }

    /// PUT with a JSON body.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self.request(Method::PUT, path, Some(body), None).await?;
        parse_body(resp).await
    }

    /// DELETE.
    pub async fn delete(&self, path: &str) -> Result<Value> {
        let resp = self.request(Method::DELETE, path, None, None).await?;
        parse_body(resp).await
    }

    /// Plaintext health check.
    pub async fn ping(&self) -> Result<String> {
        Ok(self.get_raw("/api/ping").await?.trim().to_string())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "api request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let effective_timeout = timeout
            .map(|t| t.as_secs())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let resp = req
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, effective_timeout))?;
        self.check_status(resp, &method, path).await
    }

    fn map_transport_error(&self, err: reqwest::Error, timeout_secs: u64) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                seconds: timeout_secs,
            }
        } else if err.is_connect() {
            Error::connection_failed(self.base_url.clone(), "Check URL and network.")
        } else {
            Error::Request(err.to_string())
        }
    }

    /// Maps each non-success status class to its own error message.
    async fn check_status(&self, resp: Response, method: &Method, path: &str) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let detail = if body.trim().is_empty() {
            None
        } else {
            Some(body)
        };
        Err(match status {
            StatusCode::UNAUTHORIZED => Error::AuthenticationFailed {
                detail: Some("Check API token.".to_string()),
            },
            StatusCode::FORBIDDEN => Error::PermissionDenied,
            StatusCode::NOT_FOUND => Error::NotFound {
                what: format!("{method} {path}"),
            },
            StatusCode::CONFLICT => Error::Conflict { detail },
            StatusCode::UNPROCESSABLE_ENTITY => Error::Validation { detail },
            s if s.is_server_error() => Error::ServerError {
                status: s.as_u16(),
                detail,
            },
            s => Error::Http {
                status: s.as_u16(),
                detail,
            },
        })
    }
}

/// Parses a successful response: JSON when possible, raw text otherwise,
/// `null` for an empty body.
async fn parse_body(resp: Response) -> Result<Value> {
    let text = resp.text().await.map_err(|e| Error::Request(e.to_string()))?;
    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
