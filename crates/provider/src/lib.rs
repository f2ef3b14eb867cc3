//! Birdeye market-data client.
//!
//! - [`BirdeyeClient`]: one typed method per REST endpoint
//! - [`MarketData`]: the subset consumed by alert evaluation
//! - [`HttpTransport`]: reqwest transport with retry/backoff

pub mod client;
pub mod error;
pub mod market;
pub mod models;
pub mod query;
pub mod retry;
pub mod transport;

pub use client::{BirdeyeClient, ProviderConfig, DEFAULT_BASE_URL, MAX_HOLDER_LIMIT};
pub use error::{ProviderError, ProviderResult};
pub use market::MarketData;
pub use models::*;
pub use query::{SeekQuery, SortType, TradeQuery, TradeSortBy, TxType, UiAmountMode};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, ProviderRequest, Transport, TransportResponse};
