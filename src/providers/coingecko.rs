use super::util::{endpoint, ensure_success, http_client};
use crate::core::config::ProvidersConfig;
use crate::core::{CryptoSymbol, FiatCurrency, PriceProvider, PriceQuote};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, error, instrument};

const SIMPLE_PRICE_PATH: &str = "/api/v3/simple/price";

/// Which CoinGecko API plan the provider talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinGeckoTier {
    Pro(String),
    Demo(String),
    Public,
}

impl CoinGeckoTier {
    fn auth_header(&self) -> Option<(&'static str, &str)> {
        match self {
            CoinGeckoTier::Pro(key) => Some(("x-cg-pro-api-key", key)),
            CoinGeckoTier::Demo(key) => Some(("x-cg-demo-api-key", key)),
            CoinGeckoTier::Public => None,
        }
    }
}

pub struct CoinGeckoProvider {
    base_url: String,
    tier: CoinGeckoTier,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, tier: CoinGeckoTier, timeout_secs: u64) -> Result<Self> {
        Ok(CoinGeckoProvider {
            base_url: base_url.to_string(),
            tier,
            client: http_client(timeout_secs)?,
        })
    }

    /// The keyed tier, preferring the Pro key over the Demo key. `None` without keys.
    pub fn keyed_from_config(providers: &ProvidersConfig) -> Result<Option<Self>> {
        let config = &providers.coingecko;
        let non_blank = |key: &Option<String>| {
            key.as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        };
        let (base_url, tier) = if let Some(key) = non_blank(&config.api_key) {
            (&config.pro_base_url, CoinGeckoTier::Pro(key))
        } else if let Some(key) = non_blank(&config.demo_api_key) {
            (&config.base_url, CoinGeckoTier::Demo(key))
        } else {
            return Ok(None);
        };
        Self::new(base_url, tier, providers.timeout_secs).map(Some)
    }

    pub fn public_from_config(providers: &ProvidersConfig) -> Result<Self> {
        Self::new(
            &providers.coingecko.base_url,
            CoinGeckoTier::Public,
            providers.timeout_secs,
        )
    }

    pub fn tier(&self) -> &CoinGeckoTier {
        &self.tier
    }
}

/// `{"bitcoin": {"usd": 65000.0}, ...}`
type SimplePriceResponse = HashMap<String, HashMap<String, Option<f64>>>;

fn extract_prices(
    response: &SimplePriceResponse,
    symbols: &[CryptoSymbol],
    vs_currency: &str,
) -> PriceQuote {
    symbols
        .iter()
        .filter_map(|symbol| {
            response
                .get(symbol.coingecko_id())
                .and_then(|prices| prices.get(vs_currency).copied().flatten())
                .map(|price| (*symbol, price))
        })
        .collect()
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        match self.tier {
            CoinGeckoTier::Pro(_) => "coingecko-pro",
            CoinGeckoTier::Demo(_) => "coingecko-demo",
            CoinGeckoTier::Public => "coingecko-public",
        }
    }

    #[instrument(name = "CoinGeckoQuote", skip(self, symbols), fields(tier = self.name(), fiat = %fiat))]
    async fn quote(&self, symbols: &[CryptoSymbol], fiat: FiatCurrency) -> Result<PriceQuote> {
        let ids = symbols
            .iter()
            .map(|s| s.coingecko_id())
            .collect::<Vec<_>>()
            .join(",");
        let vs_currency = fiat.as_str().to_lowercase();
        let url = endpoint(
            &self.base_url,
            SIMPLE_PRICE_PATH,
            &[("ids", ids), ("vs_currencies", vs_currency.clone())],
        )?;
        debug!("Requesting prices from {}", url);

        let mut request = self.client.get(url);
        if let Some((name, key)) = self.tier.auth_header() {
            request = request.header(name, key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for CoinGecko simple price", e))?;
        let response = ensure_success(response, "CoinGecko simple price")?;

        let text = response.text().await?;
        let data: SimplePriceResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %text, "Failed to parse CoinGecko response");
                return Err(anyhow!("Failed to parse CoinGecko response: {}", e));
            }
        };

        Ok(extract_prices(&data, symbols, &vs_currency))
    }
}
