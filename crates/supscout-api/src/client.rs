// Generic HTTP wrapper - every failure comes back as one ApiError shape
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_USER_AGENT: &str = concat!("SupScout/", env!("CARGO_PKG_VERSION"));

/// Status reported for failures that never produced an HTTP response
pub const TRANSPORT_STATUS: u16 = 0;
pub const TRANSPORT_STATUS_TEXT: &str = "Network Error";

/// Everything that can go wrong on the wire
///
/// Real HTTP failures keep the server's status code. Network trouble and
/// undecodable bodies are reported through the same type with status 0,
/// so callers can match on `status()` without caring which path failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP error! {status}: {status_text}")]
    Http { status: u16, status_text: String },

    #[error("{message}")]
    Transport { message: String },
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            message: message.into(),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::Http { status, .. } => *status,
            ApiError::Transport { .. } => TRANSPORT_STATUS,
        }
    }

    pub fn status_text(&self) -> &str {
        match self {
            ApiError::Http { status_text, .. } => status_text,
            ApiError::Transport { .. } => TRANSPORT_STATUS_TEXT,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Per-request extras merged on top of the client defaults
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::transport(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::transport(format!("Invalid header value: {}", e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Thin JSON-over-HTTP client
///
/// No retries, no timeouts, no caching. Callers that want any of that
/// build it on top.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self::from_client(client)
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `url` and decode the JSON body into `T`
    pub async fn get<T>(&self, url: &str, options: Option<&RequestOptions>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {}", url);
        let mut request = self.client.get(url);

        if let Some(options) = options {
            request = request.headers(options.header_map()?).query(&options.query);
        }

        self.execute(request, url).await
    }

    /// POST `body` as JSON to `url` and decode the JSON reply into `T`
    pub async fn post<T, B>(
        &self,
        url: &str,
        body: &B,
        options: Option<&RequestOptions>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("POST {}", url);
        let payload = serde_json::to_string(body)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut request = self.client.post(url);
        if let Some(options) = options {
            // Caller headers win over the JSON content type
            headers.extend(options.header_map()?);
            request = request.query(&options.query);
        }

        self.execute(request.headers(headers).body(payload), url).await
    }

    async fn execute<T>(&self, request: reqwest::RequestBuilder, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = ApiError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            };
            warn!("{} returned {}", url, err);
            return Err(err);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Could not decode response from {}: {}", url, e);
            ApiError::from(e)
        })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_keeps_status() {
        let err = ApiError::Http {
            status: 404,
            status_text: "Not Found".to_string(),
        };

        assert_eq!(err.status(), 404);
        assert_eq!(err.status_text(), "Not Found");
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "HTTP error! 404: Not Found");
    }

    #[test]
    fn test_transport_error_reports_status_zero() {
        let err = ApiError::transport("connection refused");

        assert_eq!(err.status(), 0);
        assert_eq!(err.status_text(), "Network Error");
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_json_errors_become_transport_errors() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ApiError::from(parse_err);

        assert_eq!(err.status(), 0);
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let options = RequestOptions::new().header("bad header", "value");
        let err = options.header_map().unwrap_err();

        assert!(err.is_transport());
    }

    #[test]
    fn test_later_header_overrides_earlier() {
        let options = RequestOptions::new()
            .header("x-trace", "one")
            .header("x-trace", "two");
        let map = options.header_map().unwrap();

        assert_eq!(map.get("x-trace").unwrap(), "two");
    }
}
