//! Alert card rendering.

use crate::format::{format_change, format_holder_shares, format_price, format_usd, yn};
use teloxide::utils::html::escape;
use walletwatch_core::Chain;
use walletwatch_provider::PriceWindow;

/// Placeholder entries shown when the holder breakdown is unavailable.
pub const HOLDER_PLACEHOLDER_LEN: usize = 10;

/// Security properties derived from the provider's security report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityFlags {
    /// No one can mint more supply.
    pub mint_authority_revoked: bool,
    /// Holders cannot be frozen or blocked from transferring.
    pub transfer_unrestricted: bool,
}

/// Everything known about one qualifying token.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenSnapshot {
    pub address: String,
    pub symbol: Option<String>,
    /// Wallet balance in token units
    pub balance: Option<f64>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub liquidity: Option<f64>,
    /// Price change over the configured window, in percent
    pub price_change: f64,
    pub total_supply: Option<f64>,
    /// `None` when creation info could not be fetched
    pub created_at: Option<String>,
    /// `None` when the security report could not be fetched
    pub security: Option<SecurityFlags>,
    /// Top holder balances as percent of total supply
    pub holder_shares: Option<Vec<f64>>,
}

impl TokenSnapshot {
    pub fn display_symbol(&self) -> &str {
        self.symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

/// A rendered alert for exactly one token.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCard {
    pub symbol: String,
    pub address: String,
    pub price_change: f64,
    /// HTML message body
    pub text: String,
}

impl AlertCard {
    pub fn from_snapshot(snapshot: &TokenSnapshot, chain: Chain, window: PriceWindow) -> Self {
        Self {
            symbol: snapshot.display_symbol().to_string(),
            address: snapshot.address.clone(),
            price_change: snapshot.price_change,
            text: render_card(snapshot, chain, window),
        }
    }
}

/// Render the fixed card layout as Telegram HTML.
pub fn render_card(snapshot: &TokenSnapshot, chain: Chain, window: PriceWindow) -> String {
    let created_at = snapshot
        .created_at
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("-");
    let (no_mint, no_blacklist) = match snapshot.security {
        Some(flags) => (
            Some(flags.mint_authority_revoked),
            Some(flags.transfer_unrestricted),
        ),
        None => (None, None),
    };
    let address = if snapshot.address.is_empty() {
        "—"
    } else {
        snapshot.address.as_str()
    };

    format!(
        "<b>${symbol} – {chain}</b>\n\
         <code>{address}</code>\n\
         \n\
         📋 <b>Info</b>\n\
         Creation Time: {created_at}\n\
         - MC: {mc}\n\
         Liq: {liq}\n\
         Price: {price} ({change} {window})\n\
         \n\
         🛡️ <b>Security</b>\n\
         NoMint {no_mint} | NoBlacklist {no_blacklist}\n\
         \n\
         💰 <b>Top10 Holding</b>\n\
         {holders}",
        symbol = escape(snapshot.display_symbol()),
        chain = chain,
        address = escape(address),
        created_at = escape(created_at),
        mc = format_usd(snapshot.market_cap),
        liq = format_usd(snapshot.liquidity),
        price = format_price(snapshot.price),
        change = format_change(snapshot.price_change),
        window = window,
        no_mint = yn(no_mint),
        no_blacklist = yn(no_blacklist),
        holders = format_holder_shares(snapshot.holder_shares.as_deref(), HOLDER_PLACEHOLDER_LEN),
    )
}
