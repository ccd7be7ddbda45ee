use super::util::{endpoint, ensure_success, http_client};
use crate::core::config::ProvidersConfig;
use crate::core::{CryptoSymbol, FiatCurrency, PriceProvider, PriceQuote};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

const QUOTES_PATH: &str = "/v1/cryptocurrency/quotes/latest";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// CoinMarketCap Pro quotes. Requires an API key.
pub struct CoinMarketCapProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl CoinMarketCapProvider {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        Ok(CoinMarketCapProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout_secs)?,
        })
    }

    /// Returns `None` when no API key is configured.
    pub fn from_config(providers: &ProvidersConfig) -> Result<Option<Self>> {
        let config = &providers.coinmarketcap;
        match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                Self::new(&config.base_url, key, providers.timeout_secs).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[derive(Deserialize, Debug)]
struct QuotesResponse {
    #[serde(default)]
    data: HashMap<String, QuoteEntry>,
}

#[derive(Deserialize, Debug)]
struct QuoteEntry {
    #[serde(default)]
    quote: HashMap<String, FiatQuote>,
}

#[derive(Deserialize, Debug)]
struct FiatQuote {
    price: Option<f64>,
}

fn extract_prices(
    response: &QuotesResponse,
    symbols: &[CryptoSymbol],
    fiat: FiatCurrency,
) -> PriceQuote {
    symbols
        .iter()
        .filter_map(|symbol| {
            response
                .data
                .get(symbol.as_str())
                .and_then(|entry| entry.quote.get(fiat.as_str()))
                .and_then(|q| q.price)
                .map(|price| (*symbol, price))
        })
        .collect()
}

#[async_trait]
impl PriceProvider for CoinMarketCapProvider {
    fn name(&self) -> &str {
        "coinmarketcap"
    }

    #[instrument(name = "CoinMarketCapQuote", skip(self, symbols), fields(fiat = %fiat))]
    async fn quote(&self, symbols: &[CryptoSymbol], fiat: FiatCurrency) -> Result<PriceQuote> {
        let joined = symbols
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = endpoint(
            &self.base_url,
            QUOTES_PATH,
            &[("symbol", joined), ("convert", fiat.to_string())],
        )?;
        debug!("Requesting quotes from {}", url);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for CoinMarketCap quotes", e))?;
        let response = ensure_success(response, "CoinMarketCap quotes")?;

        let text = response.text().await?;
        let data: QuotesResponse = serde_json::from_str(&text)
            .context("Failed to parse CoinMarketCap quotes response")?;

        let prices = extract_prices(&data, symbols, fiat);
        debug!(resolved = prices.len(), "Parsed CoinMarketCap quotes");
        Ok(prices)
    }
}
