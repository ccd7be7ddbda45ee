pub mod coingecko;
pub mod coinmarketcap;
pub mod util;

use crate::core::PriceProvider;
use crate::core::config::ProvidersConfig;
use anyhow::Result;
use coingecko::CoinGeckoProvider;
use coinmarketcap::CoinMarketCapProvider;
use tracing::debug;

/// Builds the price chain in priority order. Providers without credentials are left out;
/// the public CoinGecko endpoint is always last.
pub fn price_chain(config: &ProvidersConfig) -> Result<Vec<Box<dyn PriceProvider>>> {
    let mut chain: Vec<Box<dyn PriceProvider>> = Vec::new();
    if let Some(cmc) = CoinMarketCapProvider::from_config(config)? {
        chain.push(Box::new(cmc));
    }
    if let Some(gecko) = CoinGeckoProvider::keyed_from_config(config)? {
        chain.push(Box::new(gecko));
    }
    chain.push(Box::new(CoinGeckoProvider::public_from_config(config)?));

    debug!(
        providers = ?chain.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "Built price provider chain"
    );
    Ok(chain)
}
