//! Wrapped-token address substitution.
//!
//! Wallet listings report native assets (SOL, ETH) under wrapper-specific
//! addresses that the market-data endpoints do not index. The table maps a
//! holding's symbol to the canonical token address used for lookups.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Canonical wrapped SOL mint.
pub const WRAPPED_SOL: &str = "So11111111111111111111111111111111111111112";
/// Canonical WETH contract on Ethereum mainnet.
pub const WRAPPED_ETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrappedTokensError {
    #[error("Invalid wrapped token entry '{0}', expected SYMBOL=address")]
    InvalidEntry(String),
}

/// Symbol → canonical address table, keyed case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedTokens {
    entries: HashMap<String, String>,
}

impl Default for WrappedTokens {
    fn default() -> Self {
        let mut tokens = Self::empty();
        tokens.insert("SOL", WRAPPED_SOL);
        tokens.insert("ETH", WRAPPED_ETH);
        tokens
    }
}

impl WrappedTokens {
    /// Table with no substitutions.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace a substitution.
    pub fn insert(&mut self, symbol: &str, address: &str) {
        self.entries
            .insert(symbol.trim().to_uppercase(), address.trim().to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical address for a holding, matched on symbol first, then name.
    pub fn resolve(&self, symbol: Option<&str>, name: Option<&str>) -> Option<&str> {
        [symbol, name]
            .into_iter()
            .flatten()
            .find_map(|key| self.entries.get(&key.trim().to_uppercase()))
            .map(String::as_str)
    }
}

impl FromStr for WrappedTokens {
    type Err = WrappedTokensError;

    /// Parse `SYMBOL=address,SYMBOL=address`. Blank input yields an empty table.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = Self::empty();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (symbol, address) = entry
                .split_once('=')
                .filter(|(sym, addr)| !sym.trim().is_empty() && !addr.trim().is_empty())
                .ok_or_else(|| WrappedTokensError::InvalidEntry(entry.to_string()))?;
            tokens.insert(symbol, address);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_table() {
        let tokens = WrappedTokens::default();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.resolve(Some("SOL"), None), Some(WRAPPED_SOL));
        assert_eq!(tokens.resolve(Some("eth"), None), Some(WRAPPED_ETH));
    }

    #[test]
    fn test_resolve_falls_back_to_name() {
        let tokens = WrappedTokens::default();
        assert_eq!(tokens.resolve(Some("WIF"), Some("SOL")), Some(WRAPPED_SOL));
        assert_eq!(tokens.resolve(Some("WIF"), Some("dogwifhat")), None);
        assert_eq!(tokens.resolve(None, None), None);
    }

    #[test]
    fn test_parse_table() {
        let tokens: WrappedTokens = "SOL=So1111, bnb = 0xbb4c ,".parse().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.resolve(Some("BNB"), None), Some("0xbb4c"));
        assert_eq!(tokens.resolve(Some("ETH"), None), None);
    }

    #[test]
    fn test_parse_rejects_malformed_entry() {
        let err = "SOL".parse::<WrappedTokens>().unwrap_err();
        assert_eq!(err, WrappedTokensError::InvalidEntry("SOL".to_string()));
        assert!("=abc".parse::<WrappedTokens>().is_err());
    }

    #[test]
    fn test_parse_blank_is_empty() {
        assert!("".parse::<WrappedTokens>().unwrap().is_empty());
    }
}
