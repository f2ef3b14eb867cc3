//! Typed provider response records.
//!
//! The provider omits fields freely, so every field is optional and unknown
//! fields are ignored. Legacy endpoints use camelCase, v3 endpoints use
//! snake_case; records shared by both accept either spelling via aliases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Solana system program; an authority set to it is effectively revoked.
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

/// Price-change lookback window reported by the token overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PriceWindow {
    #[serde(rename = "1m")]
    M1,
    #[default]
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "24h")]
    H24,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown price window: {0}")]
pub struct UnknownWindow(pub String);

impl PriceWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceWindow::M1 => "1m",
            PriceWindow::M5 => "5m",
            PriceWindow::M30 => "30m",
            PriceWindow::H1 => "1h",
            PriceWindow::H2 => "2h",
            PriceWindow::H4 => "4h",
            PriceWindow::H6 => "6h",
            PriceWindow::H8 => "8h",
            PriceWindow::H12 => "12h",
            PriceWindow::H24 => "24h",
        }
    }

    pub fn all() -> &'static [PriceWindow] {
        &[
            PriceWindow::M1,
            PriceWindow::M5,
            PriceWindow::M30,
            PriceWindow::H1,
            PriceWindow::H2,
            PriceWindow::H4,
            PriceWindow::H6,
            PriceWindow::H8,
            PriceWindow::H12,
            PriceWindow::H24,
        ]
    }
}

impl fmt::Display for PriceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PriceWindow::all()
            .iter()
            .copied()
            .find(|w| w.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownWindow(wanted.to_string()))
    }
}

/// `/defi/price` and entries of `/defi/multi_price`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub value: Option<f64>,
    pub update_unix_time: Option<i64>,
    pub update_human_time: Option<String>,
    pub price_change_24h: Option<f64>,
    pub price_in_native: Option<f64>,
    pub liquidity: Option<f64>,
    pub is_scaled_ui_token: Option<bool>,
    pub scaled_value: Option<f64>,
    pub multiplier: Option<f64>,
}

/// Social and listing links attached to token overview/metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenExtensions {
    #[serde(alias = "coingeckoId")]
    pub coingecko_id: Option<String>,
    pub website: Option<String>,
    pub telegram: Option<String>,
    pub twitter: Option<String>,
    pub discord: Option<String>,
    pub medium: Option<String>,
    pub description: Option<String>,
}

/// `/defi/token_overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOverview {
    pub address: Option<String>,
    pub decimals: Option<u8>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub market_cap: Option<f64>,
    pub fdv: Option<f64>,
    pub extensions: Option<TokenExtensions>,
    #[serde(rename = "logoURI")]
    pub logo_uri: Option<String>,
    pub liquidity: Option<f64>,
    pub last_trade_unix_time: Option<i64>,
    pub last_trade_human_time: Option<String>,
    pub price: Option<f64>,
    pub history_5m_price: Option<f64>,
    pub price_change_1m_percent: Option<f64>,
    pub price_change_5m_percent: Option<f64>,
    pub price_change_30m_percent: Option<f64>,
    pub price_change_1h_percent: Option<f64>,
    pub price_change_2h_percent: Option<f64>,
    pub price_change_4h_percent: Option<f64>,
    pub price_change_6h_percent: Option<f64>,
    pub price_change_8h_percent: Option<f64>,
    pub price_change_12h_percent: Option<f64>,
    pub price_change_24h_percent: Option<f64>,
    pub unique_wallet_24h: Option<u64>,
    pub trade_24h: Option<u64>,
    pub buy_24h: Option<u64>,
    pub sell_24h: Option<u64>,
    #[serde(rename = "v24hUSD")]
    pub volume_24h_usd: Option<f64>,
    pub total_supply: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub holder: Option<u64>,
    pub number_markets: Option<u64>,
    pub is_scaled_ui_token: Option<bool>,
    pub multiplier: Option<f64>,
}

impl TokenOverview {
    /// Price change percentage for a lookback window.
    pub fn price_change(&self, window: PriceWindow) -> Option<f64> {
        match window {
            PriceWindow::M1 => self.price_change_1m_percent,
            PriceWindow::M5 => self.price_change_5m_percent,
            PriceWindow::M30 => self.price_change_30m_percent,
            PriceWindow::H1 => self.price_change_1h_percent,
            PriceWindow::H2 => self.price_change_2h_percent,
            PriceWindow::H4 => self.price_change_4h_percent,
            PriceWindow::H6 => self.price_change_6h_percent,
            PriceWindow::H8 => self.price_change_8h_percent,
            PriceWindow::H12 => self.price_change_12h_percent,
            PriceWindow::H24 => self.price_change_24h_percent,
        }
    }
}

/// `/defi/v3/token/market-data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub address: Option<String>,
    pub price: Option<f64>,
    pub liquidity: Option<f64>,
    pub total_supply: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub fdv: Option<f64>,
    pub market_cap: Option<f64>,
    pub holder: Option<u64>,
    pub is_scaled_ui_token: Option<bool>,
    pub multiplier: Option<f64>,
}

/// `/defi/v3/token/meta-data/single`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub extensions: Option<TokenExtensions>,
    pub logo_uri: Option<String>,
}

/// `/defi/token_security`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSecurity {
    pub creator_address: Option<String>,
    pub creator_owner_address: Option<String>,
    pub creator_balance: Option<f64>,
    pub creator_percentage: Option<f64>,
    /// Mint authority on Solana; absent once revoked.
    pub owner_address: Option<String>,
    pub owner_of_owner_address: Option<String>,
    pub owner_balance: Option<f64>,
    pub owner_percentage: Option<f64>,
    pub creation_tx: Option<String>,
    pub creation_time: Option<i64>,
    pub mint_tx: Option<String>,
    pub mint_time: Option<i64>,
    pub metaplex_update_authority: Option<String>,
    pub mutable_metadata: Option<bool>,
    pub top10_holder_balance: Option<f64>,
    pub top10_holder_percent: Option<f64>,
    pub top10_user_balance: Option<f64>,
    pub top10_user_percent: Option<f64>,
    pub is_true_token: Option<bool>,
    pub fake_token: Option<bool>,
    pub total_supply: Option<f64>,
    pub freezeable: Option<bool>,
    pub freeze_authority: Option<String>,
    pub transfer_fee_enable: Option<bool>,
    pub is_token2022: Option<bool>,
    pub non_transferable: Option<bool>,
    pub jup_strict_list: Option<bool>,
}

impl TokenSecurity {
    /// No one can mint more supply.
    pub fn mint_authority_revoked(&self) -> bool {
        let is_system = |addr: &Option<String>| addr.as_deref() == Some(SYSTEM_PROGRAM);
        self.owner_address.is_none()
            || is_system(&self.owner_address)
            || is_system(&self.owner_of_owner_address)
    }

    /// Holders can be frozen or are not allowed to move the token at all.
    pub fn transfer_restricted(&self) -> bool {
        self.non_transferable == Some(true) || self.freezeable == Some(true)
    }
}

/// `/defi/token_creation_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreationInfo {
    pub tx_hash: Option<String>,
    pub slot: Option<u64>,
    pub token_address: Option<String>,
    pub decimals: Option<u8>,
    pub owner: Option<String>,
    pub block_unix_time: Option<i64>,
    pub block_human_time: Option<String>,
}

/// One entry of `/defi/v3/token/holder`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenHolder {
    /// Raw amount as a decimal string.
    pub amount: Option<String>,
    pub decimals: Option<u8>,
    pub mint: Option<String>,
    pub owner: Option<String>,
    pub token_account: Option<String>,
    pub ui_amount: Option<f64>,
    pub is_scaled_ui_token: Option<bool>,
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenHolders {
    #[serde(default)]
    pub items: Vec<TokenHolder>,
}

/// One token balance in `/v1/wallet/token_list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletHolding {
    pub address: Option<String>,
    pub decimals: Option<u8>,
    /// Raw base-unit balance. Kept as f64 since it can exceed u64.
    pub balance: Option<f64>,
    pub ui_amount: Option<f64>,
    pub chain_id: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "logoURI")]
    pub logo_uri: Option<String>,
    pub price_usd: Option<f64>,
    pub value_usd: Option<f64>,
    pub is_scaled_ui_token: Option<bool>,
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPortfolio {
    pub wallet: Option<String>,
    pub total_usd: Option<f64>,
    #[serde(default)]
    pub items: Vec<WalletHolding>,
}

/// `/defi/v3/token/exit-liquidity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitLiquidity {
    #[serde(alias = "token")]
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub exit_liquidity: Option<f64>,
    pub liquidity: Option<f64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitLiquidityList {
    #[serde(default)]
    pub items: Vec<ExitLiquidity>,
}

/// One entry of `/defi/v3/token/mint-burn-txs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MintBurnTx {
    pub amount: Option<String>,
    pub block_human_time: Option<String>,
    pub block_time: Option<i64>,
    /// `mint` or `burn`.
    pub common_type: Option<String>,
    pub decimals: Option<u8>,
    pub mint: Option<String>,
    pub program_id: Option<String>,
    pub slot: Option<u64>,
    pub tx_hash: Option<String>,
    pub ui_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MintBurnTxs {
    #[serde(default)]
    pub items: Vec<MintBurnTx>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairToken {
    pub address: Option<String>,
    pub decimals: Option<u8>,
    pub icon: Option<String>,
    pub symbol: Option<String>,
}

/// `/defi/v3/pair/overview/single`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairOverview {
    pub address: Option<String>,
    pub name: Option<String>,
    pub base: Option<PairToken>,
    pub quote: Option<PairToken>,
    pub created_at: Option<String>,
    pub source: Option<String>,
    pub liquidity: Option<f64>,
    pub price: Option<f64>,
    pub volume_24h: Option<f64>,
    pub trade_24h: Option<u64>,
    pub unique_wallet_24h: Option<u64>,
}

/// One side of a swap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLeg {
    pub symbol: Option<String>,
    pub address: Option<String>,
    pub decimals: Option<u8>,
    pub price: Option<f64>,
    #[serde(alias = "uiAmount")]
    pub ui_amount: Option<f64>,
    #[serde(alias = "uiChangeAmount")]
    pub ui_change_amount: Option<f64>,
}

/// A trade from either `/defi/v3/token/txs` or `/defi/txs/token/seek_by_time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenTrade {
    #[serde(alias = "txType")]
    pub tx_type: Option<String>,
    #[serde(alias = "txHash")]
    pub tx_hash: Option<String>,
    #[serde(alias = "blockUnixTime")]
    pub block_unix_time: Option<i64>,
    pub owner: Option<String>,
    pub source: Option<String>,
    pub side: Option<String>,
    #[serde(alias = "poolId")]
    pub pool_id: Option<String>,
    #[serde(alias = "volumeUSD")]
    pub volume_usd: Option<f64>,
    pub from: Option<TradeLeg>,
    pub to: Option<TradeLeg>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePage {
    #[serde(default)]
    pub items: Vec<TokenTrade>,
    #[serde(default, alias = "hasNext")]
    pub has_next: bool,
}
