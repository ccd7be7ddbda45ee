//! Pricing abstractions and core types

use crate::core::asset::{CryptoSymbol, FiatCurrency};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Fiat price per one unit of each resolved symbol. Symbols without a price are absent.
pub type PriceQuote = BTreeMap<CryptoSymbol, f64>;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn quote(&self, symbols: &[CryptoSymbol], fiat: FiatCurrency) -> Result<PriceQuote>;
}
