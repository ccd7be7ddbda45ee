//! Persistence ports consumed by the payroll engine

use crate::core::asset::CryptoSymbol;
use crate::core::company::CompanySettings;
use crate::core::employee::{Employee, EmployeeUpdate};
use crate::core::error::Result as PayrollResult;
use crate::core::transaction::{Transaction, TxStatus};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Employee>>;
    /// All employees, ordered by `user_id`.
    async fn list(&self) -> Result<Vec<Employee>>;
    async fn upsert(&self, employee: Employee) -> Result<()>;
    /// Merges `update` into the stored record, or a fresh one, validates it and writes it
    /// in the same locked step that `apply_accumulation` uses. Invalid merges write
    /// nothing. Returns the saved record and whether it was created.
    async fn merge_upsert(&self, update: EmployeeUpdate) -> PayrollResult<(Employee, bool)>;
    /// Adds non-negative deltas to one employee's running totals in a single atomic step.
    /// Returns `None` when the employee does not exist.
    async fn apply_accumulation(
        &self,
        user_id: &str,
        symbol: CryptoSymbol,
        fiat_delta: f64,
        crypto_delta: f64,
    ) -> Result<Option<Employee>>;
}

#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn append(&self, tx: Transaction) -> Result<()>;
    /// All transactions, newest first.
    async fn list(&self) -> Result<Vec<Transaction>>;
    async fn get(&self, id: &str) -> Result<Option<Transaction>>;
    async fn set_status(&self, id: &str, status: TxStatus) -> Result<Option<Transaction>>;
}

#[async_trait]
pub trait CompanySettingsStore: Send + Sync {
    /// Current settings, or the defaults if none were saved.
    async fn get(&self) -> Result<CompanySettings>;
    /// Replaces the settings wholesale.
    async fn put(&self, settings: CompanySettings) -> Result<CompanySettings>;
}

/// Rejects deltas that would make a running total go down.
pub fn check_accumulation_delta(fiat_delta: f64, crypto_delta: f64) -> Result<()> {
    if !fiat_delta.is_finite() || !crypto_delta.is_finite() || fiat_delta < 0.0 || crypto_delta < 0.0
    {
        anyhow::bail!(
            "Accumulation deltas must be non-negative (fiat: {fiat_delta}, crypto: {crypto_delta})"
        );
    }
    Ok(())
}
