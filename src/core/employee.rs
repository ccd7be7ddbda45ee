//! Employee records and the validated upsert input

use crate::core::asset::CryptoSymbol;
use crate::core::error::{PayrollError, Result};
use crate::core::money::{FIAT_DP, round_dp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Share of gross pay assumed to be take-home when no net salary is on file.
pub const NET_FROM_GROSS_RATIO: f64 = 0.82;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertMode {
    /// A percentage of net pay is converted.
    #[default]
    Percent,
    /// A fixed fiat amount is converted.
    Fixed,
}

fn empty_addresses() -> BTreeMap<CryptoSymbol, Option<String>> {
    CryptoSymbol::ALL.iter().map(|s| (*s, None)).collect()
}

fn zero_split() -> BTreeMap<CryptoSymbol, u8> {
    CryptoSymbol::ALL.iter().map(|s| (*s, 0)).collect()
}

fn zero_crypto() -> BTreeMap<CryptoSymbol, f64> {
    CryptoSymbol::ALL.iter().map(|s| (*s, 0.0)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub user_id: String,
    #[serde(default)]
    pub percent_to_crypto: u8,
    #[serde(default)]
    pub convert_mode: ConvertMode,
    #[serde(default)]
    pub fixed_amount_fiat: f64,
    #[serde(default)]
    pub gross_salary: f64,
    #[serde(default)]
    pub net_salary: f64,
    #[serde(default = "empty_addresses")]
    pub receiving_addresses: BTreeMap<CryptoSymbol, Option<String>>,
    #[serde(default = "zero_split")]
    pub crypto_split: BTreeMap<CryptoSymbol, u8>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub accumulated_fiat: f64,
    #[serde(default = "zero_crypto")]
    pub accumulated_crypto: BTreeMap<CryptoSymbol, f64>,
}

impl Employee {
    pub fn new(user_id: &str) -> Self {
        Employee {
            user_id: user_id.to_string(),
            percent_to_crypto: 0,
            convert_mode: ConvertMode::Percent,
            fixed_amount_fiat: 0.0,
            gross_salary: 0.0,
            net_salary: 0.0,
            receiving_addresses: empty_addresses(),
            crypto_split: zero_split(),
            first_name: None,
            last_name: None,
            address: None,
            accumulated_fiat: 0.0,
            accumulated_crypto: zero_crypto(),
        }
    }

    /// Net salary on file, or the conservative estimate derived from gross.
    pub fn effective_net_salary(&self) -> f64 {
        if self.net_salary > 0.0 {
            return self.net_salary;
        }
        if self.gross_salary > 0.0 {
            return round_dp(self.gross_salary * NET_FROM_GROSS_RATIO, FIAT_DP);
        }
        0.0
    }

    pub fn split(&self, symbol: CryptoSymbol) -> u8 {
        self.crypto_split.get(&symbol).copied().unwrap_or(0)
    }

    pub fn receiving_address(&self, symbol: CryptoSymbol) -> Option<&str> {
        self.receiving_addresses
            .get(&symbol)
            .and_then(|a| a.as_deref())
            .filter(|a| !a.trim().is_empty())
    }

    pub fn accumulated(&self, symbol: CryptoSymbol) -> f64 {
        self.accumulated_crypto.get(&symbol).copied().unwrap_or(0.0)
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => String::new(),
        }
    }

    /// Symbols the employee has an address for.
    pub fn addressed_symbols(&self) -> Vec<CryptoSymbol> {
        CryptoSymbol::ALL
            .into_iter()
            .filter(|s| self.receiving_address(*s).is_some())
            .collect()
    }

    /// Checks the write-time invariants of the record.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(PayrollError::Validation("user_id must not be empty".into()));
        }
        if self.percent_to_crypto > 100 {
            return Err(PayrollError::Validation(
                "percent_to_crypto must be between 0 and 100".into(),
            ));
        }
        for (field, value) in [
            ("fixed_amount_fiat", self.fixed_amount_fiat),
            ("gross_salary", self.gross_salary),
            ("net_salary", self.net_salary),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PayrollError::Validation(format!(
                    "{field} must be a non-negative amount"
                )));
            }
        }
        if let Some((symbol, _)) = self.crypto_split.iter().find(|(_, pct)| **pct > 100) {
            return Err(PayrollError::Validation(format!(
                "crypto_split for {symbol} must be between 0 and 100"
            )));
        }

        let addressed = self.addressed_symbols();
        if !addressed.is_empty() {
            let total: u32 = addressed.iter().map(|s| u32::from(self.split(*s))).sum();
            if total != 100 {
                return Err(PayrollError::Validation(format!(
                    "crypto_split for provided addresses must sum to 100 (got {total})"
                )));
            }
        }
        Ok(())
    }

    /// Merges an update into this record. Accumulations are never touched.
    pub fn apply_update(&mut self, update: EmployeeUpdate) {
        self.percent_to_crypto = update.percent_to_crypto;
        self.convert_mode = update.convert_mode;
        self.fixed_amount_fiat = update.fixed_amount_fiat;
        self.gross_salary = update.gross_salary;
        self.net_salary = update.net_salary;

        // Only addresses sent with a value are replaced; a blank value clears the slot.
        for (symbol, address) in update.receiving_addresses {
            if let Some(address) = address {
                self.receiving_addresses
                    .insert(symbol, normalize_address(Some(address)));
            }
        }

        self.crypto_split = CryptoSymbol::ALL
            .iter()
            .map(|s| (*s, update.crypto_split.get(s).copied().unwrap_or(0)))
            .collect();

        if update.first_name.is_some() {
            self.first_name = update.first_name;
        }
        if update.last_name.is_some() {
            self.last_name = update.last_name;
        }
        if update.address.is_some() {
            self.address = update.address;
        }
    }
}

fn normalize_address(address: Option<String>) -> Option<String> {
    address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}

/// Upsert payload. Everything but the id has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub user_id: String,
    #[serde(default)]
    pub percent_to_crypto: u8,
    #[serde(default)]
    pub convert_mode: ConvertMode,
    #[serde(default)]
    pub fixed_amount_fiat: f64,
    #[serde(default)]
    pub gross_salary: f64,
    #[serde(default)]
    pub net_salary: f64,
    #[serde(default)]
    pub receiving_addresses: BTreeMap<CryptoSymbol, Option<String>>,
    #[serde(default)]
    pub crypto_split: BTreeMap<CryptoSymbol, u8>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl EmployeeUpdate {
    pub fn new(user_id: &str) -> Self {
        EmployeeUpdate {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    /// Builds the merged record for `existing` (or a fresh one) and validates it.
    pub fn merge_into(self, existing: Option<Employee>) -> Result<Employee> {
        let mut employee = existing.unwrap_or_else(|| Employee::new(self.user_id.trim()));
        employee.apply_update(self);
        employee.validate()?;
        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_with(addresses: &[(CryptoSymbol, &str)], split: &[(CryptoSymbol, u8)]) -> EmployeeUpdate {
        EmployeeUpdate {
            receiving_addresses: addresses
                .iter()
                .map(|(s, a)| (*s, Some(a.to_string())))
                .collect(),
            crypto_split: split.iter().copied().collect(),
            ..EmployeeUpdate::new("alex.roy")
        }
    }

    #[test]
    fn test_effective_net_salary_falls_back_to_gross() {
        let mut emp = Employee::new("a");
        emp.gross_salary = 2000.0;
        assert_eq!(emp.effective_net_salary(), 1640.0);

        emp.net_salary = 1700.0;
        assert_eq!(emp.effective_net_salary(), 1700.0);

        let empty = Employee::new("b");
        assert_eq!(empty.effective_net_salary(), 0.0);
    }

    #[test]
    fn test_new_employee_has_all_symbols() {
        let emp = Employee::new("a");
        assert_eq!(emp.receiving_addresses.len(), CryptoSymbol::ALL.len());
        assert_eq!(emp.crypto_split.len(), CryptoSymbol::ALL.len());
        assert_eq!(emp.accumulated_crypto.len(), CryptoSymbol::ALL.len());
    }

    #[test]
    fn test_split_must_sum_to_100_for_addressed_symbols() {
        let update = update_with(
            &[(CryptoSymbol::Btc, "bc1q"), (CryptoSymbol::Eth, "0xabc")],
            &[(CryptoSymbol::Btc, 60), (CryptoSymbol::Eth, 30)],
        );
        let err = update.merge_into(None).unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));
        assert!(err.to_string().contains("must sum to 100"));

        let update = update_with(
            &[(CryptoSymbol::Btc, "bc1q"), (CryptoSymbol::Eth, "0xabc")],
            &[(CryptoSymbol::Btc, 60), (CryptoSymbol::Eth, 40)],
        );
        let emp = update.merge_into(None).unwrap();
        assert_eq!(emp.split(CryptoSymbol::Btc), 60);
        assert_eq!(emp.split(CryptoSymbol::Usdt), 0);
    }

    #[test]
    fn test_split_ignores_unaddressed_symbols() {
        // No addresses: custody-only employee, any split is allowed.
        let update = update_with(&[], &[(CryptoSymbol::Btc, 30)]);
        assert!(update.merge_into(None).is_ok());

        // Blank addresses do not count as provided.
        let update = update_with(&[(CryptoSymbol::Btc, "   ")], &[(CryptoSymbol::Btc, 30)]);
        let emp = update.merge_into(None).unwrap();
        assert_eq!(emp.receiving_address(CryptoSymbol::Btc), None);
    }

    #[test]
    fn test_field_range_validation() {
        let mut update = EmployeeUpdate::new("a");
        update.percent_to_crypto = 101;
        assert!(update.merge_into(None).is_err());

        let mut update = EmployeeUpdate::new("a");
        update.gross_salary = -1.0;
        assert!(update.merge_into(None).is_err());

        let mut update = EmployeeUpdate::new("a");
        update.crypto_split.insert(CryptoSymbol::Eth, 150);
        assert!(update.merge_into(None).is_err());

        assert!(EmployeeUpdate::new("  ").merge_into(None).is_err());
    }

    #[test]
    fn test_update_keeps_unsent_addresses_and_accumulations() {
        let first = update_with(&[(CryptoSymbol::Btc, "bc1q")], &[(CryptoSymbol::Btc, 100)]);
        let mut existing = first.merge_into(None).unwrap();
        existing.accumulated_fiat = 42.0;

        let mut second = update_with(&[(CryptoSymbol::Eth, "0xabc")], &[
            (CryptoSymbol::Btc, 50),
            (CryptoSymbol::Eth, 50),
        ]);
        second.receiving_addresses.insert(CryptoSymbol::Usdc, None);
        second.percent_to_crypto = 25;
        let merged = second.merge_into(Some(existing)).unwrap();

        assert_eq!(merged.receiving_address(CryptoSymbol::Btc), Some("bc1q"));
        assert_eq!(merged.receiving_address(CryptoSymbol::Eth), Some("0xabc"));
        assert_eq!(merged.receiving_address(CryptoSymbol::Usdc), None);
        assert_eq!(merged.percent_to_crypto, 25);
        assert_eq!(merged.accumulated_fiat, 42.0);
    }

    #[test]
    fn test_update_validates_merged_record() {
        let first = update_with(&[(CryptoSymbol::Btc, "bc1q")], &[(CryptoSymbol::Btc, 100)]);
        let existing = first.merge_into(None).unwrap();

        // BTC address is still on file, so dropping its split breaks the invariant.
        let second = update_with(&[], &[(CryptoSymbol::Eth, 100)]);
        assert!(second.merge_into(Some(existing.clone())).is_err());

        // Clearing the address with a blank value makes the new split valid.
        let third = update_with(&[(CryptoSymbol::Btc, "")], &[(CryptoSymbol::Eth, 100)]);
        let merged = third.merge_into(Some(existing)).unwrap();
        assert!(merged.addressed_symbols().is_empty());
    }

    #[test]
    fn test_metadata_only_replaced_when_present() {
        let mut first = EmployeeUpdate::new("a");
        first.first_name = Some("Marie".into());
        first.last_name = Some("Gagnon".into());
        let existing = first.merge_into(None).unwrap();
        assert_eq!(existing.display_name(), "Marie Gagnon");

        let second = EmployeeUpdate::new("a");
        let merged = second.merge_into(Some(existing)).unwrap();
        assert_eq!(merged.first_name.as_deref(), Some("Marie"));
    }

    #[test]
    fn test_deserialize_update_from_yaml() {
        let yaml = r#"
user_id: lea.fortin
percent_to_crypto: 10
convert_mode: fixed
fixed_amount_fiat: 500
receiving_addresses:
  BTC: bc1qxyz
  ETH: null
crypto_split:
  BTC: 100
"#;
        let update: EmployeeUpdate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(update.convert_mode, ConvertMode::Fixed);
        assert_eq!(update.fixed_amount_fiat, 500.0);
        assert_eq!(update.receiving_addresses.len(), 2);

        let unknown = "user_id: x\ncrypto_split:\n  DOGE: 100\n";
        assert!(serde_yaml::from_str::<EmployeeUpdate>(unknown).is_err());
    }
}
