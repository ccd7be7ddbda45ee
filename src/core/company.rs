use crate::core::asset::{CryptoSymbol, FiatCurrency, deserialize_lenient_fiat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySettings {
    /// When set, every run pays into the company wallet for the symbol.
    #[serde(default)]
    pub custody: bool,
    #[serde(default)]
    pub company_wallets: BTreeMap<CryptoSymbol, Option<String>>,
    #[serde(default, deserialize_with = "deserialize_lenient_fiat")]
    pub base_fiat: FiatCurrency,
}

impl Default for CompanySettings {
    fn default() -> Self {
        CompanySettings {
            custody: false,
            company_wallets: CryptoSymbol::ALL.iter().map(|s| (*s, None)).collect(),
            base_fiat: FiatCurrency::default(),
        }
    }
}

impl CompanySettings {
    /// Returns a copy with one wallet slot per supported symbol and blank wallets cleared.
    pub fn normalized(self) -> Self {
        let company_wallets = CryptoSymbol::ALL
            .iter()
            .map(|s| {
                let wallet = self
                    .company_wallets
                    .get(s)
                    .cloned()
                    .flatten()
                    .map(|w| w.trim().to_string())
                    .filter(|w| !w.is_empty());
                (*s, wallet)
            })
            .collect();
        CompanySettings {
            company_wallets,
            ..self
        }
    }

    pub fn wallet(&self, symbol: CryptoSymbol) -> Option<&str> {
        self.company_wallets
            .get(&symbol)
            .and_then(|w| w.as_deref())
            .filter(|w| !w.trim().is_empty())
    }
}
