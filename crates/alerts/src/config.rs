//! Subscriber watch configuration.

use serde::{Deserialize, Serialize};

/// One subscriber's monitoring configuration, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Telegram chat ID of the subscriber
    pub subscriber_id: i64,
    /// Wallet whose holdings are inspected
    pub wallet_address: Option<String>,
    /// Minimum short-window price change in percent
    pub threshold: Option<f64>,
}

impl WatchConfig {
    /// Create an empty watch for a subscriber.
    pub fn new(subscriber_id: i64) -> Self {
        Self {
            subscriber_id,
            wallet_address: None,
            threshold: None,
        }
    }

    /// Both wallet and threshold are set.
    pub fn is_complete(&self) -> bool {
        self.wallet_address
            .as_deref()
            .is_some_and(|w| !w.trim().is_empty())
            && self.threshold.is_some_and(f64::is_finite)
    }

    /// Wallet and threshold, when both are set.
    pub fn parts(&self) -> Option<(&str, f64)> {
        if !self.is_complete() {
            return None;
        }
        Some((self.wallet_address.as_deref()?, self.threshold?))
    }
}
