use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, CLIENT_SERVICE_ERRORS,
    CLIENT_TRANSPORT_ERRORS,
};
use crate::types::{PromptRequest, PromptResponse, ServiceStatus};

/// Longest slice of an error body carried into a service error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Upper bound on a health check, independent of the prompt timeout.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the emotional-inference endpoint.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct EmotionClient {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Option<Duration>,
    status_timeout: Duration,
}

impl EmotionClient {
    /// Create a client that posts prompts to `endpoint` and never times out.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_options(endpoint, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::transport(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        })
    }

    /// Bound how long [`EmotionClient::status`] may wait.
    pub fn with_status_timeout(mut self, status_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self
    }

    /// The URL prompts are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The bound on a health check.
    pub fn status_timeout(&self) -> Duration {
        self.status_timeout
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_request_error(e: reqwest::Error, timeout: Option<Duration>) -> Error {
        if e.is_timeout() {
            let secs = timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
            Error::transport(
                format!("Request timed out after {secs:.1}s: {}", e),
                Some(Box::new(e)),
            )
        } else if e.is_connect() {
            Error::transport(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::transport(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Turn a non-success response into a service error.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("unknown status");
        let body = response.text().await.unwrap_or_default();
        let body = body.trim();
        if body.is_empty() {
            Error::service(status.as_u16(), reason)
        } else {
            let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            Error::service(status.as_u16(), format!("{reason} - {snippet}"))
        }
    }

    /// Post a prompt and decode the service's reply.
    ///
    /// Non-success statuses become [`Error::Service`]; connection failures and
    /// undecodable bodies become transport errors.  Nothing is retried.
    pub async fn ask(&self, prompt: &str) -> Result<PromptResponse> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.ask_once(prompt).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            if err.is_service() {
                CLIENT_SERVICE_ERRORS.click();
            } else {
                CLIENT_TRANSPORT_ERRORS.click();
            }
        }
        result
    }

    async fn ask_once(&self, prompt: &str) -> Result<PromptResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(Self::default_headers())
            .json(&PromptRequest::new(prompt))
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let body = response.text().await.map_err(|e| {
            Error::transport(
                format!("Failed to read response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        serde_json::from_str::<PromptResponse>(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Probe the root of the endpoint's host.
    ///
    /// Unlike [`EmotionClient::ask`], this is always bounded by the status
    /// timeout so a hung service cannot stall the caller forever.
    pub async fn status(&self) -> Result<ServiceStatus> {
        let url = self.endpoint.join("/")?;
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .timeout(self.status_timeout)
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, Some(self.status_timeout)))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<ServiceStatus>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse status: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

/// Parse and check an endpoint URL.
///
/// Only absolute `http` and `https` URLs are accepted.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::configuration(format!(
            "endpoint must use http or https, not {scheme}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_endpoint_accepts_http() {
        let url = parse_endpoint(" https://example.com/api/ask ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/ask");
    }

    #[test]
    fn parse_endpoint_rejects_other_schemes() {
        let err = parse_endpoint("ftp://example.com/api").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(parse_endpoint("/api/ask").is_err());
    }

    #[test]
    fn client_keeps_options() {
        let client =
            EmotionClient::with_options("http://localhost:8000/api/ask", Some(Duration::from_secs(5)))
                .unwrap();
        assert_eq!(client.endpoint().path(), "/api/ask");
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));
        assert!(EmotionClient::new("http://localhost:8000").unwrap().timeout().is_none());
    }

    #[test]
    fn status_timeout_defaults_and_overrides() {
        let client = EmotionClient::new("http://localhost:8000/api/ask").unwrap();
        assert_eq!(client.status_timeout(), DEFAULT_STATUS_TIMEOUT);
        let client = client.with_status_timeout(Duration::from_millis(250));
        assert_eq!(client.status_timeout(), Duration::from_millis(250));
        assert!(client.timeout().is_none());
    }
}
