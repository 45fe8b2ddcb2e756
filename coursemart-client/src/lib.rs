//! Typed HTTP client for the coursemart service.
//!
//! Reads are anonymous. Every mutating call takes a [`Credentials`] argument
//! and sends it as a bearer token; nothing is read from ambient state. Any
//! non-success status becomes [`ClientError::Api`] carrying the server's
//! `message`, or a per-operation fallback when the body has none.
//!
//! Dropping a returned future cancels the request.

#![forbid(unsafe_code)]

mod credentials;
mod error;
mod events;
mod shops;

pub use credentials::Credentials;
pub use error::ClientError;
pub use events::ImageUpload;

use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Body of every error and delete confirmation.
#[derive(Debug, Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Client for one coursemart deployment.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct CoursemartClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoursemartClient {
    /// Client for the service at `base_url`, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing `reqwest` client (connection pool, timeouts).
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// `base_url` extended by `segments`, each percent-encoded as exactly one
    /// path segment so an id can never step into another route.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            base_url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|error| invalid(error.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        request.bearer_auth(credentials.token())
    }

    /// `true` when the service and its document store are reachable.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self.http.get(self.url(&["api", "health"])?).send().await?;
        Ok(response.status().is_success())
    }
}

/// Decode a success body, or turn a failure status into [`ClientError::Api`].
async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<MessageBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    debug!(status = status.as_u16(), %message, "[client] request failed");

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Like [`decode`] for endpoints answering `{"message": ...}`.
async fn confirmation(response: Response, fallback: &str) -> Result<String, ClientError> {
    let body: MessageBody = decode(response, fallback).await?;
    Ok(body.message.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_encoded_as_a_single_segment() {
        let client = CoursemartClient::new("http://localhost:5000/");

        let url = client
            .url(&["api", "shops", "../events/abc"])
            .expect("valid base");

        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/shops/..%2Fevents%2Fabc"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let client = CoursemartClient::new("https://example.com/coursemart");

        let url = client.url(&["api", "events"]).expect("valid base");

        assert_eq!(url.as_str(), "https://example.com/coursemart/api/events");
    }

    #[test]
    fn unparsable_base_url_is_reported() {
        let client = CoursemartClient::new("not a url");

        let error = client.url(&["api", "shops"]).expect_err("no scheme");

        assert!(matches!(error, ClientError::InvalidBaseUrl { .. }));
        assert_eq!(error.status(), None);
    }
}
