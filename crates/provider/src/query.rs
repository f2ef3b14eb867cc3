//! Typed request parameters.

use serde::{Deserialize, Serialize};

/// Whether numeric amounts come back in base units or human-scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UiAmountMode {
    Raw,
    #[default]
    Scaled,
}

impl UiAmountMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UiAmountMode::Raw => "raw",
            UiAmountMode::Scaled => "scaled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
    Asc,
    #[default]
    Desc,
}

impl SortType {
    pub fn as_str(self) -> &'static str {
        match self {
            SortType::Asc => "asc",
            SortType::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeSortBy {
    #[default]
    BlockUnixTime,
    BlockNumber,
}

impl TradeSortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeSortBy::BlockUnixTime => "block_unix_time",
            TradeSortBy::BlockNumber => "block_number",
        }
    }
}

/// Trade kind filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxType {
    #[default]
    Swap,
    Buy,
    Sell,
    Add,
    Remove,
    All,
}

impl TxType {
    pub fn as_str(self) -> &'static str {
        match self {
            TxType::Swap => "swap",
            TxType::Buy => "buy",
            TxType::Sell => "sell",
            TxType::Add => "add",
            TxType::Remove => "remove",
            TxType::All => "all",
        }
    }
}

/// Filters for `/defi/v3/token/txs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeQuery {
    pub offset: u32,
    pub limit: u32,
    pub sort_by: TradeSortBy,
    pub sort_type: SortType,
    pub tx_type: Option<TxType>,
    pub owner: Option<String>,
    pub pool_id: Option<String>,
    /// DEX source, e.g. `raydium` or `pump_dot_fun`.
    pub source: Option<String>,
    pub ui_amount_mode: UiAmountMode,
    /// Inclusive unix-seconds window.
    pub time_range: Option<(i64, i64)>,
}

impl Default for TradeQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
            sort_by: TradeSortBy::default(),
            sort_type: SortType::default(),
            tx_type: None,
            owner: None,
            pool_id: None,
            source: None,
            ui_amount_mode: UiAmountMode::Scaled,
            time_range: None,
        }
    }
}

impl TradeQuery {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
            ("sort_by", self.sort_by.as_str().to_string()),
            ("sort_type", self.sort_type.as_str().to_string()),
            ("ui_amount_mode", self.ui_amount_mode.as_str().to_string()),
        ];
        if let Some(tx_type) = self.tx_type {
            params.push(("tx_type", tx_type.as_str().to_string()));
        }
        if let Some(owner) = non_blank(&self.owner) {
            params.push(("owner", owner));
        }
        if let Some(pool_id) = non_blank(&self.pool_id) {
            params.push(("pool_id", pool_id));
        }
        if let Some(source) = non_blank(&self.source) {
            params.push(("source", source));
        }
        if let Some((from, to)) = self.time_range {
            params.push(("time_range", format!("{},{}", from, to)));
        }
        params
    }
}

/// Filters for the classic `/defi/txs/token/seek_by_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekQuery {
    pub offset: u32,
    pub limit: u32,
    pub tx_type: TxType,
    pub ui_amount_mode: UiAmountMode,
    pub before_time: Option<i64>,
    pub after_time: Option<i64>,
}

impl Default for SeekQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
            tx_type: TxType::Swap,
            ui_amount_mode: UiAmountMode::Scaled,
            before_time: None,
            after_time: None,
        }
    }
}

impl SeekQuery {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
            ("tx_type", self.tx_type.as_str().to_string()),
            ("ui_amount_mode", self.ui_amount_mode.as_str().to_string()),
        ];
        if let Some(before) = self.before_time {
            params.push(("before_time", before.to_string()));
        }
        if let Some(after) = self.after_time {
            params.push(("after_time", after.to_string()));
        }
        params
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
