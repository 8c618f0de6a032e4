//! HTTP client for the dose tracker API.
//!
//! Used by the `hl` client commands. Configuration comes from
//! [`Config`](crate::config::Config): base URL, user identifier and optional
//! API key.

use chrono::{DateTime, FixedOffset};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Config;
use crate::models::*;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Client bound to one user's dose log.
#[derive(Debug, Clone)]
pub struct DoseClient {
    base_url: String,
    user_id: String,
    api_key: Option<String>,
    client: Client,
}

impl DoseClient {
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            user_id: user_id.into(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_url, &config.user_id, config.api_key.clone())
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// URL of `segments` under this user. The user identifier and every
    /// segment are percent-encoded, so `/`, `?` and `#` stay inside their
    /// segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("users")
            .push(&self.user_id)
            .extend(segments);
        Ok(url)
    }

    /// Build a request for a path under this user, with optional auth header.
    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let mut req = self.client.request(method, self.url(segments)?);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        Ok(req)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    // ============================================================
    // Dose Operations
    // ============================================================

    /// All doses, newest first.
    pub async fn list_doses(&self) -> Result<Vec<Dose>, ClientError> {
        let response = self.request(Method::GET, &["doses"])?.send().await?;
        self.handle_response(response).await
    }

    pub async fn get_dose(&self, id: &str) -> Result<Dose, ClientError> {
        let response = self
            .request(Method::GET, &["doses", id])?
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn create_dose(&self, input: &DoseInput) -> Result<Dose, ClientError> {
        let response = self
            .request(Method::POST, &["doses"])?
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Replace a dose's amount, note and (when given) timestamp.
    pub async fn update_dose(&self, id: &str, input: &DoseInput) -> Result<Dose, ClientError> {
        let response = self
            .request(Method::PUT, &["doses", id])?
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete_dose(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &["doses", id])?
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Delete the whole log. Returns how many doses were removed.
    pub async fn clear_doses(&self) -> Result<usize, ClientError> {
        let response = self.request(Method::DELETE, &["doses"])?.send().await?;
        let cleared: ClearedResponse = self.handle_response(response).await?;
        Ok(cleared.deleted)
    }

    // ============================================================
    // Load Operations
    // ============================================================

    /// Load snapshot at `at`, or at the server's current time.
    pub async fn current_load(
        &self,
        at: Option<DateTime<FixedOffset>>,
    ) -> Result<LoadView, ClientError> {
        let mut req = self.request(Method::GET, &["load"])?;
        if let Some(at) = at {
            req = req.query(&[("at", at.to_rfc3339())]);
        }
        let response = req.send().await?;
        self.handle_response(response).await
    }

    pub async fn history(
        &self,
        days: u32,
        end: Option<DateTime<FixedOffset>>,
    ) -> Result<HistoryView, ClientError> {
        let mut req = self
            .request(Method::GET, &["history"])?
            .query(&[("days", days.to_string())]);
        if let Some(end) = end {
            req = req.query(&[("end", end.to_rfc3339())]);
        }
        let response = req.send().await?;
        self.handle_response(response).await
    }
}

/// Turn a non-success status into the matching [`ClientError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
        StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        _ => Err(ClientError::Server(format!("{}: {}", status, body))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str, user_id: &str) -> DoseClient {
        DoseClient::new(base_url, user_id, None)
    }

    #[test]
    fn url_appends_user_and_segments() {
        let url = client("http://localhost:17010/api/v1", "alice")
            .url(&["doses", "d1"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:17010/api/v1/users/alice/doses/d1");
    }

    #[test]
    fn url_tolerates_trailing_slash_on_base() {
        let url = client("http://localhost:17010/api/v1/", "alice")
            .url(&["load"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:17010/api/v1/users/alice/load");
    }

    #[test]
    fn url_encodes_reserved_characters_in_user() {
        let url = client("http://localhost:17010/api/v1", "jo/ann?x#y")
            .url(&["doses"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:17010/api/v1/users/jo%2Fann%3Fx%23y/doses"
        );
    }

    #[test]
    fn url_rejects_unparseable_base() {
        let result = client("not a url", "alice").url(&["doses"]);
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }
}
