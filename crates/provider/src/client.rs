//! Birdeye Data Service client.
//!
//! One method per endpoint. Every request carries the API key and chain as
//! fixed headers; responses are unwrapped from the `{success, data}`
//! envelope into typed records.

use crate::error::{ProviderError, ProviderResult};
use crate::models::*;
use crate::query::{SeekQuery, TradeQuery, UiAmountMode};
use crate::retry::RetryPolicy;
use crate::transport::{
    HttpTransport, ProviderRequest, Transport, TransportResponse, API_KEY_HEADER, CHAIN_HEADER,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use walletwatch_core::Chain;

pub const DEFAULT_BASE_URL: &str = "https://public-api.birdeye.so";

/// Exit-liquidity endpoints only serve this chain.
pub const EXIT_LIQUIDITY_CHAIN: Chain = Chain::Base;

/// Holder pages are capped by the provider.
pub const MAX_HOLDER_LIMIT: u32 = 1000;

/// Configuration for the provider client.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub chain: Chain,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("chain", &self.chain)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            chain: Chain::Solana,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Unwrap a raw response into `T`, enforcing the status and envelope rules.
pub(crate) fn decode_envelope<T: DeserializeOwned>(response: TransportResponse) -> ProviderResult<T> {
    if response.status >= 400 {
        return Err(ProviderError::Http {
            status: response.status,
            body: response.body,
        });
    }

    let envelope: Envelope = serde_json::from_str(&response.body)?;
    if !envelope.success {
        return Err(ProviderError::Api(
            envelope
                .message
                .unwrap_or_else(|| "request unsuccessful".to_string()),
        ));
    }

    match envelope.data {
        None | Some(serde_json::Value::Null) => Err(ProviderError::MissingData),
        Some(data) => Ok(serde_json::from_value(data)?),
    }
}

fn require_address(address: &str) -> ProviderResult<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ProviderError::InvalidParameters(
            "address must not be empty".to_string(),
        ));
    }
    Ok(address.to_string())
}

/// Comma-separated address list with blanks dropped.
fn join_addresses<I, S>(addresses: I) -> ProviderResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = addresses
        .into_iter()
        .map(|a| a.as_ref().trim().to_string())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        return Err(ProviderError::InvalidParameters(
            "address list must not be empty".to_string(),
        ));
    }
    Ok(joined)
}

/// Authenticated client for the market-data API.
#[derive(Clone)]
pub struct BirdeyeClient {
    api_key: String,
    chain: Chain,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for BirdeyeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BirdeyeClient")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl BirdeyeClient {
    /// Create a client backed by the reqwest transport.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let transport = HttpTransport::new(&config.base_url, config.timeout, config.retry.clone())?;
        Self::with_transport(&config.api_key, config.chain, Arc::new(transport))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(
        api_key: &str,
        chain: Chain,
        transport: Arc<dyn Transport>,
    ) -> ProviderResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::InvalidParameters(
                "API key is required".to_string(),
            ));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            chain,
            transport,
        })
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    fn build_request(
        &self,
        path: &'static str,
        query: Vec<(&'static str, String)>,
        chain: Chain,
    ) -> ProviderRequest {
        ProviderRequest {
            path,
            query,
            headers: vec![
                ("accept", "application/json".to_string()),
                (API_KEY_HEADER, self.api_key.clone()),
                (CHAIN_HEADER, chain.header_value().to_string()),
            ],
        }
    }

    async fn request_on<T: DeserializeOwned>(
        &self,
        path: &'static str,
        query: Vec<(&'static str, String)>,
        chain: Chain,
    ) -> ProviderResult<T> {
        let request = self.build_request(path, query, chain);
        debug!(path, chain = chain.header_value(), "Provider request");
        let response = self.transport.get(&request).await?;
        decode_envelope(response)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        path: &'static str,
        query: Vec<(&'static str, String)>,
    ) -> ProviderResult<T> {
        self.request_on(path, query, self.chain).await
    }

    // -- Prices & market snapshots --

    /// `GET /defi/price`
    pub async fn price(&self, address: &str, mode: UiAmountMode) -> ProviderResult<TokenPrice> {
        let query = vec![
            ("address", require_address(address)?),
            ("ui_amount_mode", mode.as_str().to_string()),
        ];
        self.request("/defi/price", query).await
    }

    /// `GET /defi/multi_price`. Addresses without a price map to `None`.
    pub async fn multi_price<I, S>(
        &self,
        addresses: I,
        mode: UiAmountMode,
        include_liquidity: Option<bool>,
        check_liquidity: Option<f64>,
    ) -> ProviderResult<HashMap<String, Option<TokenPrice>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut query = vec![
            ("list_address", join_addresses(addresses)?),
            ("ui_amount_mode", mode.as_str().to_string()),
        ];
        if let Some(include) = include_liquidity {
            query.push(("include_liquidity", include.to_string()));
        }
        if let Some(check) = check_liquidity {
            query.push(("check_liquidity", check.to_string()));
        }
        self.request("/defi/multi_price", query).await
    }

    /// `GET /defi/token_overview`
    pub async fn token_overview(
        &self,
        address: &str,
        frames: &[PriceWindow],
    ) -> ProviderResult<TokenOverview> {
        let mut query = vec![("address", require_address(address)?)];
        if !frames.is_empty() {
            let frames = frames
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("frames", frames));
        }
        self.request("/defi/token_overview", query).await
    }

    /// `GET /defi/v3/token/market-data`
    pub async fn market_data(
        &self,
        address: &str,
        mode: UiAmountMode,
    ) -> ProviderResult<MarketSnapshot> {
        let query = vec![
            ("address", require_address(address)?),
            ("ui_amount_mode", mode.as_str().to_string()),
        ];
        self.request("/defi/v3/token/market-data", query).await
    }

    /// `GET /defi/v3/token/market-data/multiple`
    pub async fn market_data_multiple<I, S>(
        &self,
        addresses: I,
        mode: UiAmountMode,
    ) -> ProviderResult<HashMap<String, Option<MarketSnapshot>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = vec![
            ("list_address", join_addresses(addresses)?),
            ("ui_amount_mode", mode.as_str().to_string()),
        ];
        self.request("/defi/v3/token/market-data/multiple", query)
            .await
    }

    // -- Token metadata & security --

    /// `GET /defi/v3/token/meta-data/single`
    pub async fn token_metadata(&self, address: &str) -> ProviderResult<TokenMetadata> {
        let query = vec![("address", require_address(address)?)];
        self.request("/defi/v3/token/meta-data/single", query).await
    }

    /// `GET /defi/token_security`
    pub async fn token_security(&self, address: &str) -> ProviderResult<TokenSecurity> {
        let query = vec![("address", require_address(address)?)];
        self.request("/defi/token_security", query).await
    }

    /// `GET /defi/token_creation_info`
    pub async fn token_creation_info(&self, address: &str) -> ProviderResult<TokenCreationInfo> {
        let query = vec![("address", require_address(address)?)];
        self.request("/defi/token_creation_info", query).await
    }

    /// `GET /defi/v3/token/exit-liquidity`, always against Base.
    pub async fn exit_liquidity(&self, address: &str) -> ProviderResult<ExitLiquidity> {
        let query = vec![("address", require_address(address)?)];
        self.request_on("/defi/v3/token/exit-liquidity", query, EXIT_LIQUIDITY_CHAIN)
            .await
    }

    /// `GET /defi/v3/token/exit-liquidity/multiple`, always against Base.
    pub async fn exit_liquidity_multiple<I, S>(&self, addresses: I) -> ProviderResult<ExitLiquidityList>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = vec![("list_address", join_addresses(addresses)?)];
        self.request_on(
            "/defi/v3/token/exit-liquidity/multiple",
            query,
            EXIT_LIQUIDITY_CHAIN,
        )
        .await
    }

    // -- Holders & supply --

    /// `GET /defi/v3/token/holder`. `limit` is capped at [`MAX_HOLDER_LIMIT`].
    pub async fn token_holders(
        &self,
        address: &str,
        offset: u32,
        limit: u32,
        mode: UiAmountMode,
    ) -> ProviderResult<TokenHolders> {
        let query = vec![
            ("address", require_address(address)?),
            ("offset", offset.to_string()),
            ("limit", limit.min(MAX_HOLDER_LIMIT).to_string()),
            ("ui_amount_mode", mode.as_str().to_string()),
        ];
        self.request("/defi/v3/token/holder", query).await
    }

    /// `GET /defi/v3/token/mint-burn-txs` (Solana only).
    pub async fn mint_burn_txs(
        &self,
        address: &str,
        offset: u32,
        limit: u32,
    ) -> ProviderResult<MintBurnTxs> {
        let query = vec![
            ("address", require_address(address)?),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        self.request("/defi/v3/token/mint-burn-txs", query).await
    }

    // -- Pairs & trades --

    /// `GET /defi/v3/pair/overview/single`
    pub async fn pair_overview(
        &self,
        pair_address: &str,
        mode: UiAmountMode,
    ) -> ProviderResult<PairOverview> {
        let query = vec![
            ("address", require_address(pair_address)?),
            ("ui_amount_mode", mode.as_str().to_string()),
        ];
        self.request("/defi/v3/pair/overview/single", query).await
    }

    /// `GET /defi/v3/token/txs`
    pub async fn token_trades(&self, address: &str, filter: &TradeQuery) -> ProviderResult<TradePage> {
        let mut query = vec![("address", require_address(address)?)];
        query.extend(filter.params());
        self.request("/defi/v3/token/txs", query).await
    }

    /// `GET /defi/txs/token/seek_by_time`
    pub async fn token_trades_by_time(
        &self,
        address: &str,
        filter: &SeekQuery,
    ) -> ProviderResult<TradePage> {
        let mut query = vec![("address", require_address(address)?)];
        query.extend(filter.params());
        self.request("/defi/txs/token/seek_by_time", query).await
    }

    // -- Wallet --

    /// `GET /v1/wallet/token_list`
    pub async fn wallet_portfolio(&self, wallet: &str) -> ProviderResult<WalletPortfolio> {
        let query = vec![("wallet", require_address(wallet)?)];
        self.request("/v1/wallet/token_list", query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records requests and replies with a canned response.
    struct RecordingTransport {
        response: TransportResponse,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: TransportResponse::new(status, body),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> ProviderRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get(&self, request: &ProviderRequest) -> ProviderResult<TransportResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn client(transport: Arc<RecordingTransport>) -> BirdeyeClient {
        BirdeyeClient::with_transport("test-key", Chain::Solana, transport).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let transport = RecordingTransport::replying(200, "{}");
        let result = BirdeyeClient::with_transport("  ", Chain::Solana, transport);
        assert!(matches!(result, Err(ProviderError::InvalidParameters(_))));
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: "super-secret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[tokio::test]
    async fn test_fixed_headers_sent() {
        let transport =
            RecordingTransport::replying(200, r#"{"success": true, "data": {"value": 1.5}}"#);
        let client = client(transport.clone());

        let price = client.price(" So111 ", UiAmountMode::Raw).await.unwrap();
        assert_eq!(price.value, Some(1.5));

        let request = transport.last();
        assert_eq!(request.path, "/defi/price");
        assert_eq!(request.header(API_KEY_HEADER), Some("test-key"));
        assert_eq!(request.header(CHAIN_HEADER), Some("solana"));
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.param("address"), Some("So111"));
        assert_eq!(request.param("ui_amount_mode"), Some("raw"));
    }

    #[tokio::test]
    async fn test_exit_liquidity_overrides_chain() {
        let transport = RecordingTransport::replying(
            200,
            r#"{"success": true, "data": {"token": "0xabc", "exit_liquidity": 1000.0}}"#,
        );
        let client = client(transport.clone());

        let exit = client.exit_liquidity("0xabc").await.unwrap();
        assert_eq!(exit.address.as_deref(), Some("0xabc"));
        assert_eq!(exit.exit_liquidity, Some(1000.0));
        assert_eq!(transport.last().header(CHAIN_HEADER), Some("base"));

        client
            .exit_liquidity_multiple(["0xabc", "", "0xdef"])
            .await
            .unwrap();
        let request = transport.last();
        assert_eq!(request.header(CHAIN_HEADER), Some("base"));
        assert_eq!(request.param("list_address"), Some("0xabc,0xdef"));

        // Other calls keep the configured chain.
        let _ = client.token_security("0xabc").await;
        assert_eq!(transport.last().header(CHAIN_HEADER), Some("solana"));
    }

    #[tokio::test]
    async fn test_http_error_maps_status() {
        let transport = RecordingTransport::replying(503, "unavailable");
        let err = client(transport).token_overview("abc", &[]).await.unwrap_err();
        match err {
            ProviderError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope() {
        let transport = RecordingTransport::replying(
            200,
            r#"{"success": false, "message": "Unauthorized"}"#,
        );
        let err = client(transport).wallet_portfolio("wallet").await.unwrap_err();
        assert!(matches!(err, ProviderError::Api(ref m) if m == "Unauthorized"));
    }

    #[tokio::test]
    async fn test_missing_data_and_bad_json() {
        let transport = RecordingTransport::replying(200, r#"{"success": true, "data": null}"#);
        let err = client(transport).token_creation_info("abc").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingData));

        let transport = RecordingTransport::replying(200, "<html>");
        let err = client(transport).token_creation_info("abc").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_invalid_parameters_skip_network() {
        let transport = RecordingTransport::replying(200, r#"{"success": true, "data": {}}"#);
        let client = client(transport.clone());

        let err = client.token_security("   ").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidParameters(_)));

        let empty: [&str; 0] = [];
        let err = client
            .multi_price(empty, UiAmountMode::Raw, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidParameters(_)));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn test_holder_limit_capped() {
        let transport = RecordingTransport::replying(
            200,
            r#"{"success": true, "data": {"items": [{"owner": "o", "ui_amount": 10.0}]}}"#,
        );
        let client = client(transport.clone());
        let holders = client
            .token_holders("mint", 0, 5_000, UiAmountMode::Scaled)
            .await
            .unwrap();
        assert_eq!(holders.items.len(), 1);
        assert_eq!(transport.last().param("limit"), Some("1000"));
    }

    #[tokio::test]
    async fn test_multi_price_with_null_entries() {
        let transport = RecordingTransport::replying(
            200,
            r#"{"success": true, "data": {"a": {"value": 2.0}, "b": null}}"#,
        );
        let client = client(transport.clone());
        let prices = client
            .multi_price(vec!["a".to_string(), "b".to_string()], UiAmountMode::Raw, Some(true), None)
            .await
            .unwrap();
        assert_eq!(prices["a"].as_ref().and_then(|p| p.value), Some(2.0));
        assert!(prices["b"].is_none());
        assert_eq!(transport.last().param("include_liquidity"), Some("true"));
    }

    #[tokio::test]
    async fn test_overview_frames_param() {
        let transport = RecordingTransport::replying(200, r#"{"success": true, "data": {}}"#);
        let client = client(transport.clone());
        client
            .token_overview("mint", &[PriceWindow::M5, PriceWindow::H1])
            .await
            .unwrap();
        assert_eq!(transport.last().param("frames"), Some("5m,1h"));
    }

    #[tokio::test]
    async fn test_trades_query_forwarded() {
        let transport = RecordingTransport::replying(
            200,
            r#"{"success": true, "data": {"items": [{"tx_hash": "h"}], "has_next": false}}"#,
        );
        let client = client(transport.clone());
        let page = client
            .token_trades("mint", &TradeQuery::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        let request = transport.last();
        assert_eq!(request.path, "/defi/v3/token/txs");
        assert_eq!(request.param("sort_type"), Some("desc"));
    }
}
