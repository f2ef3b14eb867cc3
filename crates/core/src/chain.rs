//! Blockchain chain identifiers and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chain name could not be recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown chain: {0}")]
pub struct UnknownChain(pub String);

/// Blockchain network supported by the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Solana,
    Ethereum,
    Arbitrum,
    Avalanche,
    Bsc,
    Optimism,
    Polygon,
    Base,
    Zksync,
    Sui,
}

impl Chain {
    /// Identifier sent in the provider's `x-chain` header.
    pub fn header_value(self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Ethereum => "ethereum",
            Chain::Arbitrum => "arbitrum",
            Chain::Avalanche => "avalanche",
            Chain::Bsc => "bsc",
            Chain::Optimism => "optimism",
            Chain::Polygon => "polygon",
            Chain::Base => "base",
            Chain::Zksync => "zksync",
            Chain::Sui => "sui",
        }
    }

    /// Check if this chain is EVM-compatible.
    #[inline]
    pub fn is_evm(self) -> bool {
        !matches!(self, Chain::Solana | Chain::Sui)
    }

    /// Human-readable label used in alert cards.
    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Solana => "Solana",
            Chain::Ethereum => "Ethereum",
            Chain::Arbitrum => "Arbitrum",
            Chain::Avalanche => "Avalanche",
            Chain::Bsc => "BSC",
            Chain::Optimism => "Optimism",
            Chain::Polygon => "Polygon",
            Chain::Base => "Base",
            Chain::Zksync => "zkSync",
            Chain::Sui => "Sui",
        }
    }

    /// Get all chain variants.
    pub fn all() -> &'static [Chain] {
        &[
            Chain::Solana,
            Chain::Ethereum,
            Chain::Arbitrum,
            Chain::Avalanche,
            Chain::Bsc,
            Chain::Optimism,
            Chain::Polygon,
            Chain::Base,
            Chain::Zksync,
            Chain::Sui,
        ]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Chain::all()
            .iter()
            .copied()
            .find(|c| c.header_value().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownChain(wanted.to_string()))
    }
}
