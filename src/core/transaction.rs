use crate::core::asset::{CryptoSymbol, FiatCurrency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[default]
    Pending,
    Confirmed,
}

impl Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Pending => f.write_str("pending"),
            TxStatus::Confirmed => f.write_str("confirmed"),
        }
    }
}

/// One employee's share of a disbursement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub user_id: String,
    pub fiat_amount: f64,
    pub crypto_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub fiat_amount: f64,
    pub fiat_currency: FiatCurrency,
    pub crypto_symbol: CryptoSymbol,
    pub crypto_amount: f64,
    pub num_employees: usize,
    pub addresses: Vec<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub status: TxStatus,
    /// Fiat per one unit of crypto at execution time.
    pub price_at_tx: f64,
    #[serde(default)]
    pub per_employee_breakdown: Option<Vec<BreakdownEntry>>,
}

impl Transaction {
    pub fn breakdown(&self) -> &[BreakdownEntry] {
        self.per_employee_breakdown.as_deref().unwrap_or_default()
    }
}
