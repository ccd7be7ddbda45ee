//! Ordered price-provider chain with soft-failure fallback.

use crate::core::error::{PayrollError, Result};
use crate::core::{CryptoSymbol, FiatCurrency, PriceProvider, PriceQuote};
use tracing::{debug, info, instrument, warn};

/// Outcome of asking one provider in the chain.
#[derive(Debug)]
enum Attempt {
    Resolved(PriceQuote),
    Empty,
    Failed(anyhow::Error),
}

pub struct PriceResolver {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl PriceResolver {
    /// `providers` are tried in the given order.
    pub fn new(providers: Vec<Box<dyn PriceProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    async fn attempt(
        provider: &dyn PriceProvider,
        symbols: &[CryptoSymbol],
        fiat: FiatCurrency,
    ) -> Attempt {
        match provider.quote(symbols, fiat).await {
            Ok(mut quote) => {
                quote.retain(|symbol, price| {
                    symbols.contains(symbol) && price.is_finite() && *price > 0.0
                });
                if quote.is_empty() {
                    Attempt::Empty
                } else {
                    Attempt::Resolved(quote)
                }
            }
            Err(e) => Attempt::Failed(e),
        }
    }

    /// Returns the first non-empty quote in chain order. Partial quotes are returned as-is;
    /// callers treat a missing symbol as "no price for that symbol".
    #[instrument(name = "ResolvePrices", skip(self, symbols), fields(fiat = %fiat))]
    pub async fn resolve(&self, fiat: FiatCurrency, symbols: &[CryptoSymbol]) -> Result<PriceQuote> {
        for provider in &self.providers {
            debug!(provider = provider.name(), "Requesting prices");
            match Self::attempt(provider.as_ref(), symbols, fiat).await {
                Attempt::Resolved(quote) => {
                    info!(
                        provider = provider.name(),
                        resolved = quote.len(),
                        requested = symbols.len(),
                        "Resolved prices"
                    );
                    return Ok(quote);
                }
                Attempt::Empty => {
                    warn!(provider = provider.name(), "Provider returned no usable prices");
                }
                Attempt::Failed(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed, falling back");
                }
            }
        }
        Err(PayrollError::PricesUnavailable { fiat })
    }

    /// Resolves a single symbol, failing if the winning provider did not price it.
    pub async fn resolve_one(&self, fiat: FiatCurrency, symbol: CryptoSymbol) -> Result<f64> {
        let quote = self.resolve(fiat, &CryptoSymbol::ALL).await?;
        quote
            .get(&symbol)
            .copied()
            .ok_or(PayrollError::PriceUnavailable { symbol, fiat })
    }
}
