use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::ProbeError;

/// Header carrying the probe's delivery coordinates as session context.
pub const DEFAULT_LOCATION_HEADER: &str = "x-sladash-location";

/// A decoded 2xx response from the commerce API.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Value,
}

/// HTTP client for the commerce API's serviceability and item endpoints.
///
/// Every request is a single GET with the coordinates embedded in a
/// session-context header. Non-2xx statuses, timeouts, and undecodable
/// bodies are returned as typed errors; nothing is retried here.
pub struct ProbeClient {
    client: Client,
    base_url: Url,
    location_header: String,
}

impl ProbeClient {
    /// Creates a `ProbeClient` with the per-request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidBaseUrl`] if `base_url` cannot serve as a
    /// URL base, or [`ProbeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout_ms: u64, user_agent: &str) -> Result<Self, ProbeError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            location_header: DEFAULT_LOCATION_HEADER.to_string(),
        })
    }

    /// Overrides the name of the coordinates header.
    #[must_use]
    pub fn with_location_header(mut self, name: &str) -> Self {
        self.location_header = name.to_ascii_lowercase();
        self
    }

    /// Fetches the store layout that serves the given coordinates.
    ///
    /// # Errors
    ///
    /// See [`Self::get_json`].
    pub async fn fetch_serviceability(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ProbeResponse, ProbeError> {
        let url = self.endpoint(&["api", "v1", "serviceability"])?;
        self.get_json(url, latitude, longitude).await
    }

    /// Fetches one item's detail as seen from one store.
    ///
    /// # Errors
    ///
    /// See [`Self::get_json`].
    pub async fn fetch_item(
        &self,
        store_id: &str,
        item_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<ProbeResponse, ProbeError> {
        let url = self.endpoint(&["api", "v1", "stores", store_id, "items", item_id])?;
        self.get_json(url, latitude, longitude).await
    }

    /// Issues the GET and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::Timeout`] when the request exceeds the client timeout.
    /// - [`ProbeError::UnexpectedStatus`] for any non-2xx status.
    /// - [`ProbeError::Http`] on other transport failures.
    ///
    /// A 2xx body that is not JSON is passed on as a JSON string so the
    /// normalizer marks it malformed instead of failing the probe.
    async fn get_json(
        &self,
        url: Url,
        latitude: f64,
        longitude: f64,
    ) -> Result<ProbeResponse, ProbeError> {
        let url_str = url.to_string();
        let response = self
            .client
            .get(url)
            .header(self.location_header.as_str(), location_header_value(latitude, longitude))
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &url_str))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url_str,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, &url_str))?;
        let body = serde_json::from_str::<Value>(&body).unwrap_or_else(|e| {
            tracing::debug!(url = %url_str, error = %e, "2xx body is not JSON");
            Value::String(body)
        });

        Ok(ProbeResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProbeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProbeError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ProbeError> {
    let url = Url::parse(base_url).map_err(|e| ProbeError::InvalidBaseUrl {
        base_url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ProbeError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: "expected an http or https URL".to_string(),
        });
    }
    Ok(url)
}

/// Renders the coordinates header, e.g. `{"lat":12.97,"lng":77.59}`.
pub(crate) fn location_header_value(latitude: f64, longitude: f64) -> String {
    serde_json::json!({ "lat": latitude, "lng": longitude }).to_string()
}

fn classify_transport_error(err: reqwest::Error, url: &str) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Timeout {
            url: url.to_string(),
        }
    } else {
        ProbeError::Http(err)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
