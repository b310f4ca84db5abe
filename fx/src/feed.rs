//! Live rate feeds.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use simplecurrency_common::CurrencyCode;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::RateFetchError;

/// Default endpoint of the open exchange rate API.
pub const DEFAULT_FEED_URL: &str = "https://open.er-api.com/v6/latest";

/// A remote source of rates relative to a base currency.
#[async_trait]
pub trait RateFeed: Send + Sync {
    /// Get the feed name.
    fn name(&self) -> &str;

    /// Fetch the latest rates for `base` (1 base = rate units of each code).
    async fn fetch_latest(
        &self,
        base: &CurrencyCode,
    ) -> Result<HashMap<CurrencyCode, f64>, RateFetchError>;
}

/// Body returned by the latest-rates endpoint.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

/// Feed backed by `GET {base_url}/{BASE}` on an open.er-api.com compatible
/// endpoint.
pub struct OpenErApiFeed {
    client: Client,
    base_url: String,
}

impl OpenErApiFeed {
    /// Create a feed for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "HTTP client build failed, falling back to client without timeout");
                Client::new()
            });

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, base: &CurrencyCode) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), base)
    }

    /// Parse a latest-rates body into a rate map.
    fn parse_body(body: &str) -> Result<HashMap<CurrencyCode, f64>, RateFetchError> {
        let response: LatestRatesResponse = serde_json::from_str(body)
            .map_err(|e| RateFetchError::Malformed(e.to_string()))?;

        if response.rates.is_empty() {
            return Err(RateFetchError::Malformed("empty rates".to_string()));
        }

        Ok(response
            .rates
            .into_iter()
            .map(|(code, rate)| (CurrencyCode::from(code), rate))
            .collect())
    }
}

impl Default for OpenErApiFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL, Duration::from_secs(5))
    }
}

#[async_trait]
impl RateFeed for OpenErApiFeed {
    fn name(&self) -> &str {
        "open-er-api"
    }

    async fn fetch_latest(
        &self,
        base: &CurrencyCode,
    ) -> Result<HashMap<CurrencyCode, f64>, RateFetchError> {
        let url = self.endpoint(base);
        debug!(url = %url, "Requesting latest rates");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                RateFetchError::Timeout
            } else {
                RateFetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RateFetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RateFetchError::Timeout
            } else {
                RateFetchError::Network(e.to_string())
            }
        })?;

        Self::parse_body(&body)
    }
}

/// Feed that never returns data, leaving the provider on fallback rates.
#[derive(Debug, Default)]
pub struct StaticRateFeed;

#[async_trait]
impl RateFeed for StaticRateFeed {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_latest(
        &self,
        _base: &CurrencyCode,
    ) -> Result<HashMap<CurrencyCode, f64>, RateFetchError> {
        Err(RateFetchError::Disabled)
    }
}

/// Mock rate feed for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateFeed {
    response: parking_lot::Mutex<Result<HashMap<CurrencyCode, f64>, RateFetchError>>,
    delay: Duration,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateFeed {
    /// A feed answering with the given rates.
    pub fn succeeding(rates: &[(&str, f64)]) -> Self {
        Self::with_response(Ok(Self::to_map(rates)))
    }

    /// A feed failing with the given error.
    pub fn failing(error: RateFetchError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<HashMap<CurrencyCode, f64>, RateFetchError>) -> Self {
        Self {
            response: parking_lot::Mutex::new(response),
            delay: Duration::ZERO,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the scripted rates.
    pub fn set_rates(&self, rates: &[(&str, f64)]) {
        *self.response.lock() = Ok(Self::to_map(rates));
    }

    /// Replace the scripted response with a failure.
    pub fn set_error(&self, error: RateFetchError) {
        *self.response.lock() = Err(error);
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn to_map(rates: &[(&str, f64)]) -> HashMap<CurrencyCode, f64> {
        rates
            .iter()
            .map(|(code, rate)| (CurrencyCode::new(*code), *rate))
            .collect()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateFeed for MockRateFeed {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_latest(
        &self,
        _base: &CurrencyCode,
    ) -> Result<HashMap<CurrencyCode, f64>, RateFetchError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        let body = r#"{"result":"success","base_code":"EUR","rates":{"EUR":1,"USD":1.0842,"GBP":0.8551}}"#;

        let rates = OpenErApiFeed::parse_body(body).unwrap();

        assert_eq!(rates.len(), 3);
        assert_eq!(rates.get("USD"), Some(&1.0842));
        assert_eq!(rates.get("EUR"), Some(&1.0));
    }

    #[test]
    fn test_parse_body_without_rates() {
        let result = OpenErApiFeed::parse_body(r#"{"result":"error","error-type":"unsupported-code"}"#);
        assert!(matches!(result, Err(RateFetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_body_empty_rates() {
        let result = OpenErApiFeed::parse_body(r#"{"rates":{}}"#);
        assert!(matches!(result, Err(RateFetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_body_non_numeric_rate() {
        let result = OpenErApiFeed::parse_body(r#"{"rates":{"USD":"1.08"}}"#);
        assert!(matches!(result, Err(RateFetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_body_not_json() {
        let result = OpenErApiFeed::parse_body("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(RateFetchError::Malformed(_))));
    }

    #[test]
    fn test_endpoint() {
        let feed = OpenErApiFeed::new("https://example.test/v6/latest/", Duration::from_secs(1));
        assert_eq!(
            feed.endpoint(&CurrencyCode::eur()),
            "https://example.test/v6/latest/EUR"
        );
    }

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/v6/latest")
    }

    #[tokio::test]
    async fn test_fetch_latest_success() {
        let url = serve_once("200 OK", r#"{"result":"success","rates":{"USD":1.1,"EUR":1}}"#).await;
        let feed = OpenErApiFeed::new(url, Duration::from_secs(2));

        let rates = feed.fetch_latest(&CurrencyCode::eur()).await.unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get("USD"), Some(&1.1));
        assert_eq!(rates.get("EUR"), Some(&1.0));
    }

    #[tokio::test]
    async fn test_fetch_latest_non_ok_status() {
        let url = serve_once("503 Service Unavailable", "").await;
        let feed = OpenErApiFeed::new(url, Duration::from_secs(2));

        let result = feed.fetch_latest(&CurrencyCode::eur()).await;

        assert_eq!(result, Err(RateFetchError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_latest_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept the connection but never answer
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let feed = OpenErApiFeed::new(format!("http://{addr}/v6/latest"), Duration::from_millis(100));

        let result = feed.fetch_latest(&CurrencyCode::eur()).await;

        assert_eq!(result, Err(RateFetchError::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_latest_connection_refused() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let feed = OpenErApiFeed::new(format!("http://{addr}/v6/latest"), Duration::from_secs(2));

        let result = feed.fetch_latest(&CurrencyCode::eur()).await;

        assert!(matches!(result, Err(RateFetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_static_feed_is_disabled() {
        let result = StaticRateFeed.fetch_latest(&CurrencyCode::eur()).await;
        assert_eq!(result, Err(RateFetchError::Disabled));
    }

    #[tokio::test]
    async fn test_mock_feed_counts_calls() {
        let feed = MockRateFeed::succeeding(&[("USD", 1.1)]);

        let rates = feed.fetch_latest(&CurrencyCode::eur()).await.unwrap();
        assert_eq!(rates.get("USD"), Some(&1.1));

        feed.set_error(RateFetchError::Status(500));
        let result = feed.fetch_latest(&CurrencyCode::eur()).await;
        assert_eq!(result, Err(RateFetchError::Status(500)));

        assert_eq!(feed.calls(), 2);
    }
}
