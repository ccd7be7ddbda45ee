use crate::core::asset::{CryptoSymbol, FiatCurrency};
use std::fmt::Display;
use thiserror::Error;

/// Why a payroll run ended up with nobody to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// No employee routes any fiat to the symbol.
    NoRequests,
    /// Employees route fiat to the symbol but none has an address for it.
    NoValidAddresses,
}

impl Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibleReason::NoRequests => f.write_str("No employee requests found for this crypto"),
            IneligibleReason::NoValidAddresses => {
                f.write_str("No eligible employee requests with valid addresses")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Unsupported crypto symbol: {0}")]
    UnsupportedSymbol(String),
    #[error("Unsupported fiat currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Price not available: every price provider failed for {fiat}")]
    PricesUnavailable { fiat: FiatCurrency },
    #[error("Price not available for {symbol} in {fiat}")]
    PriceUnavailable {
        symbol: CryptoSymbol,
        fiat: FiatCurrency,
    },
    #[error("Company custody enabled but wallet missing for {0}")]
    WalletMissing(CryptoSymbol),
    #[error("{0}")]
    NoEligibleRequests(IneligibleReason),
    #[error("Transaction not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T, E = PayrollError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ineligible_messages_are_distinct() {
        let custody = PayrollError::NoEligibleRequests(IneligibleReason::NoRequests);
        let direct = PayrollError::NoEligibleRequests(IneligibleReason::NoValidAddresses);
        assert_eq!(custody.to_string(), "No employee requests found for this crypto");
        assert_eq!(
            direct.to_string(),
            "No eligible employee requests with valid addresses"
        );
    }

    #[test]
    fn test_price_unavailable_names_symbol() {
        let err = PayrollError::PriceUnavailable {
            symbol: CryptoSymbol::Eth,
            fiat: FiatCurrency::Usd,
        };
        assert_eq!(err.to_string(), "Price not available for ETH in USD");
    }
}
