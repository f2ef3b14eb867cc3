//! HTTP transport for provider requests.
//!
//! The client builds fully-specified [`ProviderRequest`]s; a [`Transport`]
//! only moves bytes. Retry policy lives here so the client can stay unaware
//! of which failures are transient.

use crate::error::{ProviderError, ProviderResult};
use crate::retry::{is_retryable_status, RetryPolicy};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the provider API key. Redacted from debug output.
pub const API_KEY_HEADER: &str = "X-API-KEY";
/// Header carrying the target chain identifier.
pub const CHAIN_HEADER: &str = "x-chain";

/// A GET request against the provider API.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    /// Path relative to the base URL, e.g. `/defi/token_overview`.
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl ProviderRequest {
    /// Value of a header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of a query parameter, if set.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case(API_KEY_HEADER) {
                    (*key, "<redacted>")
                } else {
                    (*key, value.as_str())
                }
            })
            .collect();
        f.debug_struct("ProviderRequest")
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &headers)
            .finish()
    }
}

/// Raw response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Moves provider requests over the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform an idempotent GET request.
    async fn get(&self, request: &ProviderRequest) -> ProviderResult<TransportResponse>;
}

/// reqwest-backed transport with bounded exponential-backoff retries.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> ProviderResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        // Validate once so per-request joins cannot fail on the base.
        Url::parse(&base_url)?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, request: &ProviderRequest) -> ProviderResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(key, value)| (*key, value.as_str())),
            );
        }
        Ok(url)
    }

    async fn send_once(
        &self,
        url: &Url,
        request: &ProviderRequest,
    ) -> Result<TransportResponse, reqwest::Error> {
        let mut builder = self.client.get(url.clone());
        for (key, value) in &request.headers {
            builder = builder.header(*key, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &ProviderRequest) -> ProviderResult<TransportResponse> {
        let url = self.build_url(request)?;
        let mut attempt = 0u32;

        loop {
            let outcome = self.send_once(&url, request).await;
            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status),
                Err(e) => e.is_connect() || e.is_timeout(),
            };

            if !retryable || !self.retry.should_retry(attempt + 1) {
                // Exhausted retryable statuses fall through to the client,
                // which maps them to ProviderError::Http.
                return match outcome {
                    Ok(response) => {
                        debug!(path = request.path, status = response.status, "Provider response");
                        Ok(response)
                    }
                    Err(e) => Err(ProviderError::from(e)),
                };
            }

            attempt += 1;
            let delay = self.retry.calculate_delay_duration(attempt);
            match &outcome {
                Ok(response) => warn!(
                    path = request.path,
                    status = response.status,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying provider request"
                ),
                Err(e) => warn!(
                    path = request.path,
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying provider request"
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BirdeyeClient;
    use crate::query::UiAmountMode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use walletwatch_core::Chain;

    /// Serve one canned status per connection, repeating the last one.
    /// Returns the base URL and a request counter.
    async fn stub_server(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let status = statuses.get(n).or(statuses.last()).copied().unwrap_or(200);

                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&chunk[..read]),
                    }
                }

                let body = if status == 200 {
                    r#"{"success":true,"data":{"value":1.5}}"#.to_string()
                } else {
                    format!("upstream status {}", status)
                };
                let response = format!(
                    "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    fn fast_retries(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(1, 5, max_retries).without_jitter()
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            path: "/defi/price",
            query: vec![
                ("address", "So11111111111111111111111111111111111111112".to_string()),
                ("ui_amount_mode", "raw".to_string()),
            ],
            headers: vec![
                (API_KEY_HEADER, "secret-key".to_string()),
                (CHAIN_HEADER, "solana".to_string()),
            ],
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", request());
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("solana"));
    }

    #[test]
    fn test_header_and_param_lookup() {
        let req = request();
        assert_eq!(req.header("x-api-key"), Some("secret-key"));
        assert_eq!(req.header("X-CHAIN"), Some("solana"));
        assert_eq!(req.param("ui_amount_mode"), Some("raw"));
        assert_eq!(req.param("missing"), None);
    }

    #[test]
    fn test_build_url_appends_query() {
        let transport = HttpTransport::new(
            "https://public-api.birdeye.so/",
            Duration::from_secs(5),
            RetryPolicy::none(),
        )
        .unwrap();
        assert_eq!(transport.base_url(), "https://public-api.birdeye.so");

        let url = transport.build_url(&request()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://public-api.birdeye.so/defi/price?address=So11111111111111111111111111111111111111112&ui_amount_mode=raw"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpTransport::new("not a url", Duration::from_secs(5), RetryPolicy::none());
        assert!(matches!(result, Err(ProviderError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_retries_transient_status_until_success() {
        let (base_url, hits) = stub_server(vec![503, 503, 200]).await;
        let transport = HttpTransport::new(&base_url, Duration::from_secs(5), fast_retries(3)).unwrap();

        let response = transport.get(&request()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let (base_url, hits) = stub_server(vec![404]).await;
        let transport = HttpTransport::new(&base_url, Duration::from_secs(5), fast_retries(3)).unwrap();

        let response = transport.get(&request()).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_status() {
        let (base_url, hits) = stub_server(vec![503]).await;
        let transport = HttpTransport::new(&base_url, Duration::from_secs(5), fast_retries(2)).unwrap();
        let client = BirdeyeClient::with_transport("key", Chain::Solana, Arc::new(transport)).unwrap();

        let err = client
            .price("So11111111111111111111111111111111111111112", UiAmountMode::Raw)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 503, .. }), "{:?}", err);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new(&base_url, Duration::from_secs(5), fast_retries(2)).unwrap();
        let err = transport.get(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)), "{:?}", err);
    }
}
