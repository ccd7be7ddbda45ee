use crate::core::error::Result as PayrollResult;
use crate::core::store::check_accumulation_delta;
use crate::core::{
    CompanySettings, CompanySettingsStore, CryptoSymbol, Employee, EmployeeStore,
    EmployeeUpdate, Transaction, TransactionLog, TxStatus,
};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory employee store, transaction log and settings.
///
/// Each mutation takes the write lock for exactly one record, so concurrent runs
/// interleave at record granularity. Clones share the same data.
#[derive(Default, Clone)]
pub struct MemoryStore {
    employees: Arc<RwLock<BTreeMap<String, Employee>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
    settings: Arc<RwLock<Option<CompanySettings>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.get(user_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.values().cloned().collect())
    }

    async fn upsert(&self, employee: Employee) -> Result<()> {
        let mut employees = self.employees.write().await;
        debug!(user_id = %employee.user_id, "Employee PUT");
        employees.insert(employee.user_id.clone(), employee);
        Ok(())
    }

    async fn merge_upsert(&self, update: EmployeeUpdate) -> PayrollResult<(Employee, bool)> {
        let mut employees = self.employees.write().await;
        let existing = employees.get(update.user_id.trim()).cloned();
        let created = existing.is_none();
        let employee = update.merge_into(existing)?;
        debug!(user_id = %employee.user_id, created, "Employee MERGE");
        employees.insert(employee.user_id.clone(), employee.clone());
        Ok((employee, created))
    }

    async fn apply_accumulation(
        &self,
        user_id: &str,
        symbol: CryptoSymbol,
        fiat_delta: f64,
        crypto_delta: f64,
    ) -> Result<Option<Employee>> {
        check_accumulation_delta(fiat_delta, crypto_delta)?;
        let mut employees = self.employees.write().await;
        let Some(employee) = employees.get_mut(user_id) else {
            return Ok(None);
        };
        employee.accumulated_fiat += fiat_delta;
        *employee.accumulated_crypto.entry(symbol).or_insert(0.0) += crypto_delta;
        Ok(Some(employee.clone()))
    }
}

#[async_trait]
impl TransactionLog for MemoryStore {
    async fn append(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        debug!(id = %tx.id, "Transaction APPEND");
        transactions.insert(0, tx);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn set_status(&self, id: &str, status: TxStatus) -> Result<Option<Transaction>> {
        let mut transactions = self.transactions.write().await;
        Ok(transactions.iter_mut().find(|t| t.id == id).map(|t| {
            t.status = status;
            t.clone()
        }))
    }
}

#[async_trait]
impl CompanySettingsStore for MemoryStore {
    async fn get(&self) -> Result<CompanySettings> {
        let settings = self.settings.read().await;
        Ok(settings.clone().unwrap_or_default())
    }

    async fn put(&self, settings: CompanySettings) -> Result<CompanySettings> {
        let normalized = settings.normalized();
        let mut current = self.settings.write().await;
        *current = Some(normalized.clone());
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FiatCurrency;
    use chrono::Utc;

    fn tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: Utc::now(),
            fiat_amount: 10.0,
            fiat_currency: FiatCurrency::Usd,
            crypto_symbol: CryptoSymbol::Btc,
            crypto_amount: 0.0002,
            num_employees: 1,
            addresses: vec!["bc1q".to_string()],
            tx_hash: None,
            status: TxStatus::Pending,
            price_at_tx: 50000.0,
            per_employee_breakdown: None,
        }
    }

    #[tokio::test]
    async fn test_employees_listed_by_user_id() {
        let store = MemoryStore::new();
        for id in ["zoe", "alex", "marie"] {
            store.upsert(Employee::new(id)).await.unwrap();
        }
        let ids: Vec<String> = EmployeeStore::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.user_id)
            .collect();
        assert_eq!(ids, vec!["alex", "marie", "zoe"]);
    }

    #[tokio::test]
    async fn test_apply_accumulation() {
        let store = MemoryStore::new();
        store.upsert(Employee::new("alex")).await.unwrap();

        let updated = store
            .apply_accumulation("alex", CryptoSymbol::Eth, 100.0, 0.05)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.accumulated_fiat, 100.0);
        assert_eq!(updated.accumulated(CryptoSymbol::Eth), 0.05);

        let missing = store
            .apply_accumulation("nobody", CryptoSymbol::Eth, 1.0, 1.0)
            .await
            .unwrap();
        assert!(missing.is_none());

        assert!(
            store
                .apply_accumulation("alex", CryptoSymbol::Eth, -1.0, 0.0)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_transactions_newest_first() {
        let store = MemoryStore::new();
        store.append(tx("first")).await.unwrap();
        store.append(tx("second")).await.unwrap();

        let ids: Vec<String> = TransactionLog::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_set_status() {
        let store = MemoryStore::new();
        store.append(tx("abc")).await.unwrap();

        let confirmed = store
            .set_status("abc", TxStatus::Confirmed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.status, TxStatus::Confirmed);
        let stored = TransactionLog::get(&store, "abc").await.unwrap().unwrap();
        assert_eq!(stored.status, TxStatus::Confirmed);

        assert!(
            store
                .set_status("missing", TxStatus::Confirmed)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_settings_default_and_replace() {
        let store = MemoryStore::new();
        let settings = CompanySettingsStore::get(&store).await.unwrap();
        assert_eq!(settings, CompanySettings::default());

        let mut replacement = CompanySettings {
            custody: true,
            ..Default::default()
        };
        replacement.company_wallets.clear();
        replacement
            .company_wallets
            .insert(CryptoSymbol::Btc, Some("wallet123".into()));
        let saved = store.put(replacement).await.unwrap();
        assert_eq!(saved.company_wallets.len(), CryptoSymbol::ALL.len());

        let settings = CompanySettingsStore::get(&store).await.unwrap();
        assert!(settings.custody);
        assert_eq!(settings.wallet(CryptoSymbol::Btc), Some("wallet123"));
    }
}
