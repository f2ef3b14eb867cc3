//! Alert evaluation: wallet holdings in, qualifying token cards out.

use crate::card::{AlertCard, SecurityFlags, TokenSnapshot};
use crate::config::WatchConfig;
use crate::db::{Database, DbError};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use walletwatch_core::{Chain, WrappedTokens};
use walletwatch_provider::{
    MarketData, PriceWindow, ProviderError, TokenCreationInfo, TokenHolders, WalletHolding,
};

#[derive(Error, Debug)]
pub enum EvaluatorError {
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Evaluation settings shared by every subscriber.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Chain label shown on cards
    pub chain: Chain,
    /// Price-change window compared against the threshold
    pub window: PriceWindow,
    /// Number of top holders in the breakdown
    pub holder_limit: u32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            chain: Chain::Solana,
            window: PriceWindow::M5,
            holder_limit: 10,
        }
    }
}

/// Outcome of evaluating one subscriber's watch.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Wallet or threshold missing; nothing was fetched.
    NotConfigured,
    /// The wallet holds no tokens.
    NoTokens { wallet: String },
    /// Cards for qualifying tokens, in portfolio order. May be empty.
    Alerts { threshold: f64, cards: Vec<AlertCard> },
}

/// A price change qualifies when it is at least the threshold.
pub fn qualifies(change: f64, threshold: f64) -> bool {
    change.is_finite() && change >= threshold
}

/// Creation timestamp for display: provider text, else the formatted unix time.
fn creation_time(info: &TokenCreationInfo) -> Option<String> {
    if let Some(human) = info.block_human_time.as_deref().map(str::trim) {
        if !human.is_empty() {
            return Some(human.to_string());
        }
    }
    let ts = info.block_unix_time?;
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Top holder balances as percent of total supply.
fn holder_shares(holders: &TokenHolders, total_supply: Option<f64>, limit: u32) -> Option<Vec<f64>> {
    let total = total_supply.filter(|t| t.is_finite() && *t > 0.0)?;
    let shares: Vec<f64> = holders
        .items
        .iter()
        .take(limit as usize)
        .filter_map(|h| h.ui_amount)
        .map(|amount| amount / total * 100.0)
        .collect();
    if shares.is_empty() {
        None
    } else {
        Some(shares)
    }
}

/// Builds alert cards for subscriber watches.
pub struct AlertEvaluator {
    db: Database,
    market: Arc<dyn MarketData>,
    wrapped: WrappedTokens,
    config: EvaluatorConfig,
}

impl AlertEvaluator {
    pub fn new(
        db: Database,
        market: Arc<dyn MarketData>,
        wrapped: WrappedTokens,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            db,
            market,
            wrapped,
            config,
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Look up a subscriber's watch and evaluate it.
    pub async fn evaluate(&self, subscriber_id: i64) -> Result<Evaluation, EvaluatorError> {
        match self.db.get_watch(subscriber_id).await? {
            Some(watch) => self.evaluate_watch(&watch).await,
            None => Ok(Evaluation::NotConfigured),
        }
    }

    /// Evaluate an already loaded watch.
    pub async fn evaluate_watch(&self, watch: &WatchConfig) -> Result<Evaluation, EvaluatorError> {
        let Some((wallet, threshold)) = watch.parts() else {
            return Ok(Evaluation::NotConfigured);
        };

        let portfolio = self.market.wallet_portfolio(wallet).await?;
        if portfolio.items.is_empty() {
            info!(subscriber_id = watch.subscriber_id, wallet, "No tokens found in wallet");
            return Ok(Evaluation::NoTokens {
                wallet: wallet.to_string(),
            });
        }

        info!(
            subscriber_id = watch.subscriber_id,
            tokens = portfolio.items.len(),
            threshold,
            "Checking wallet holdings"
        );

        let mut cards = Vec::new();
        for holding in &portfolio.items {
            if let Some(card) = self.evaluate_holding(holding, threshold).await {
                cards.push(card);
            }
        }

        Ok(Evaluation::Alerts { threshold, cards })
    }

    async fn evaluate_holding(&self, holding: &WalletHolding, threshold: f64) -> Option<AlertCard> {
        let address = self
            .wrapped
            .resolve(holding.symbol.as_deref(), holding.name.as_deref())
            .map(str::to_string)
            .or_else(|| holding.address.clone())
            .filter(|a| !a.trim().is_empty());
        let Some(address) = address else {
            debug!(symbol = ?holding.symbol, "Skipping holding without address");
            return None;
        };

        let overview = match self.market.token_overview(&address).await {
            Ok(overview) => overview,
            Err(e) => {
                warn!(token = %address, error = %e, "Failed to fetch token overview");
                return None;
            }
        };

        let window = self.config.window;
        let Some(change) = overview.price_change(window).filter(|c| c.is_finite()) else {
            debug!(token = %address, window = %window, "Price change not available");
            return None;
        };

        if !qualifies(change, threshold) {
            return None;
        }

        let (creation, security, holders) = tokio::join!(
            self.market.token_creation_info(&address),
            self.market.token_security(&address),
            self.market.token_holders(&address, self.config.holder_limit),
        );

        let created_at = match creation {
            Ok(info) => creation_time(&info),
            Err(e) => {
                warn!(token = %address, error = %e, "Failed to fetch token creation info");
                None
            }
        };

        let security = match security {
            Ok(report) => Some(SecurityFlags {
                mint_authority_revoked: report.mint_authority_revoked(),
                transfer_unrestricted: !report.transfer_restricted(),
            }),
            Err(e) => {
                warn!(token = %address, error = %e, "Failed to fetch token security data");
                None
            }
        };

        let holder_shares = match holders {
            Ok(holders) => holder_shares(&holders, overview.total_supply, self.config.holder_limit),
            Err(e) => {
                warn!(token = %address, error = %e, "Failed to fetch top token holders");
                None
            }
        };

        let snapshot = TokenSnapshot {
            symbol: overview.symbol.clone().or_else(|| holding.symbol.clone()),
            address,
            balance: holding.ui_amount,
            price: overview.price,
            market_cap: overview.market_cap,
            liquidity: overview.liquidity,
            price_change: change,
            total_supply: overview.total_supply,
            created_at,
            security,
            holder_shares,
        };

        Some(AlertCard::from_snapshot(
            &snapshot,
            self.config.chain,
            self.config.window,
        ))
    }
}
