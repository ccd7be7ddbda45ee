//! Disbursement broker abstraction

use crate::core::asset::{CryptoSymbol, FiatCurrency};
use anyhow::Result;
use async_trait::async_trait;

/// What the broker is asked to buy and where to send it.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionOrder {
    pub fiat_total: f64,
    pub fiat_currency: FiatCurrency,
    pub symbol: CryptoSymbol,
    pub crypto_total: f64,
    pub addresses: Vec<String>,
}

#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Buys and distributes the order, returning the broker's transaction hash.
    async fn distribute(&self, order: &DistributionOrder) -> Result<String>;
}
