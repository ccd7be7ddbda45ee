//! Supported crypto and fiat assets

use crate::core::error::PayrollError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CryptoSymbol {
    Btc,
    Eth,
    Usdt,
    Usdc,
}

impl CryptoSymbol {
    pub const ALL: [CryptoSymbol; 4] = [
        CryptoSymbol::Btc,
        CryptoSymbol::Eth,
        CryptoSymbol::Usdt,
        CryptoSymbol::Usdc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoSymbol::Btc => "BTC",
            CryptoSymbol::Eth => "ETH",
            CryptoSymbol::Usdt => "USDT",
            CryptoSymbol::Usdc => "USDC",
        }
    }

    /// CoinGecko coin id for the symbol.
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            CryptoSymbol::Btc => "bitcoin",
            CryptoSymbol::Eth => "ethereum",
            CryptoSymbol::Usdt => "tether",
            CryptoSymbol::Usdc => "usd-coin",
        }
    }
}

impl Display for CryptoSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptoSymbol {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BTC" => Ok(CryptoSymbol::Btc),
            "ETH" => Ok(CryptoSymbol::Eth),
            "USDT" => Ok(CryptoSymbol::Usdt),
            "USDC" => Ok(CryptoSymbol::Usdc),
            _ => Err(PayrollError::UnsupportedSymbol(s.to_string())),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum FiatCurrency {
    #[default]
    Usd,
    Cad,
    Eur,
}

impl FiatCurrency {
    pub const ALL: [FiatCurrency; 3] = [FiatCurrency::Usd, FiatCurrency::Cad, FiatCurrency::Eur];

    pub fn as_str(&self) -> &'static str {
        match self {
            FiatCurrency::Usd => "USD",
            FiatCurrency::Cad => "CAD",
            FiatCurrency::Eur => "EUR",
        }
    }

    /// Parses a currency code, falling back to the default for anything unsupported.
    pub fn normalize(code: &str) -> FiatCurrency {
        code.parse().unwrap_or_default()
    }
}

impl Display for FiatCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FiatCurrency {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(FiatCurrency::Usd),
            "CAD" => Ok(FiatCurrency::Cad),
            "EUR" => Ok(FiatCurrency::Eur),
            _ => Err(PayrollError::UnsupportedCurrency(s.to_string())),
        }
    }
}

/// Serde helper for fields where an unknown currency silently becomes the default.
pub fn deserialize_lenient_fiat<'de, D>(deserializer: D) -> Result<FiatCurrency, D::Error>
where
    D: Deserializer<'de>,
{
    let code = Option::<String>::deserialize(deserializer)?;
    Ok(code.map(|c| FiatCurrency::normalize(&c)).unwrap_or_default())
}
