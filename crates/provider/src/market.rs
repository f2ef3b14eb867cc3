//! The narrow view of the provider that alert evaluation depends on.

use crate::client::BirdeyeClient;
use crate::error::ProviderResult;
use crate::models::{TokenCreationInfo, TokenHolders, TokenOverview, TokenSecurity, WalletPortfolio};
use crate::query::UiAmountMode;
use async_trait::async_trait;

/// Market-data operations used when building alert cards.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn wallet_portfolio(&self, wallet: &str) -> ProviderResult<WalletPortfolio>;

    async fn token_overview(&self, address: &str) -> ProviderResult<TokenOverview>;

    async fn token_creation_info(&self, address: &str) -> ProviderResult<TokenCreationInfo>;

    async fn token_security(&self, address: &str) -> ProviderResult<TokenSecurity>;

    /// Largest holders first, at most `limit` entries.
    async fn token_holders(&self, address: &str, limit: u32) -> ProviderResult<TokenHolders>;
}

#[async_trait]
impl MarketData for BirdeyeClient {
    async fn wallet_portfolio(&self, wallet: &str) -> ProviderResult<WalletPortfolio> {
        BirdeyeClient::wallet_portfolio(self, wallet).await
    }

    async fn token_overview(&self, address: &str) -> ProviderResult<TokenOverview> {
        BirdeyeClient::token_overview(self, address, &[]).await
    }

    async fn token_creation_info(&self, address: &str) -> ProviderResult<TokenCreationInfo> {
        BirdeyeClient::token_creation_info(self, address).await
    }

    async fn token_security(&self, address: &str) -> ProviderResult<TokenSecurity> {
        BirdeyeClient::token_security(self, address).await
    }

    async fn token_holders(&self, address: &str, limit: u32) -> ProviderResult<TokenHolders> {
        BirdeyeClient::token_holders(self, address, 0, limit, UiAmountMode::Scaled).await
    }
}
