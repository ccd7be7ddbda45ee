use crate::core::error::Result as PayrollResult;
use crate::core::store::check_accumulation_delta;
use crate::core::{
    CompanySettings, CompanySettingsStore, CryptoSymbol, Employee, EmployeeStore,
    EmployeeUpdate, Transaction, TransactionLog, TxStatus,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

const EMPLOYEES: &str = "employees";
const TRANSACTIONS: &str = "transactions";
const TRANSACTION_INDEX: &str = "transaction_index";
const COMPANY: &str = "company";
const SETTINGS_KEY: &str = "settings";

/// Transactions are keyed by `u64::MAX - seq` so that key order is newest first.
fn order_key(seq: u64) -> Vec<u8> {
    (u64::MAX - seq).to_be_bytes().to_vec()
}

fn seq_from_key(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .with_context(|| format!("Corrupt transaction key of {} bytes", key.len()))?;
    Ok(u64::MAX - u64::from_be_bytes(bytes))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Employee store, transaction log and settings persisted in a fjall keyspace.
///
/// Read-modify-write operations are serialized by `write_lock`; a transaction and its
/// id index entry are written in one batch.
pub struct DiskStore {
    keyspace: Keyspace,
    employees: PartitionHandle,
    transactions: PartitionHandle,
    transaction_index: PartitionHandle,
    company: PartitionHandle,
    write_lock: Mutex<()>,
    next_seq: AtomicU64,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;
        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;

        let open = |name: &str| -> Result<PartitionHandle> {
            keyspace
                .open_partition(name, PartitionCreateOptions::default())
                .with_context(|| format!("Failed to open partition: {name}"))
        };
        let employees = open(EMPLOYEES)?;
        let transactions = open(TRANSACTIONS)?;
        let transaction_index = open(TRANSACTION_INDEX)?;
        let company = open(COMPANY)?;

        let next_seq = match transactions.iter().next().transpose()? {
            Some((key, _)) => seq_from_key(&key)? + 1,
            None => 0,
        };
        debug!(path = %path.display(), next_seq, "Opened disk store");

        Ok(Self {
            keyspace,
            employees,
            transactions,
            transaction_index,
            company,
            write_lock: Mutex::new(()),
            next_seq: AtomicU64::new(next_seq),
        })
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist store")
    }

    fn read_employee(&self, user_id: &str) -> Result<Option<Employee>> {
        self.employees
            .get(user_id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn read_transaction(&self, id: &str) -> Result<Option<(Vec<u8>, Transaction)>> {
        let Some(key) = self.transaction_index.get(id)? else {
            return Ok(None);
        };
        let bytes = self
            .transactions
            .get(&key)?
            .with_context(|| format!("Transaction index points at a missing record: {id}"))?;
        Ok(Some((key.to_vec(), decode(&bytes)?)))
    }
}

#[async_trait]
impl EmployeeStore for DiskStore {
    async fn get(&self, user_id: &str) -> Result<Option<Employee>> {
        self.read_employee(user_id)
    }

    async fn list(&self) -> Result<Vec<Employee>> {
        self.employees
            .iter()
            .map(|item| {
                let (_, value) = item?;
                decode(&value)
            })
            .collect()
    }

    async fn upsert(&self, employee: Employee) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.employees
            .insert(employee.user_id.as_bytes().to_vec(), encode(&employee)?)?;
        debug!(user_id = %employee.user_id, "Employee PUT");
        self.persist()
    }

    async fn merge_upsert(&self, update: EmployeeUpdate) -> PayrollResult<(Employee, bool)> {
        let _guard = self.write_lock.lock().await;
        let existing = self.read_employee(update.user_id.trim())?;
        let created = existing.is_none();
        let employee = update.merge_into(existing)?;
        self.employees
            .insert(employee.user_id.as_bytes().to_vec(), encode(&employee)?)
            .map_err(anyhow::Error::from)?;
        debug!(user_id = %employee.user_id, created, "Employee MERGE");
        self.persist()?;
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
        let _guard = self.write_lock.lock().await;
        let Some(mut employee) = self.read_employee(user_id)? else {
            return Ok(None);
        };
        employee.accumulated_fiat += fiat_delta;
        *employee.accumulated_crypto.entry(symbol).or_insert(0.0) += crypto_delta;
        self.employees
            .insert(user_id.as_bytes().to_vec(), encode(&employee)?)?;
        self.persist()?;
        Ok(Some(employee))
    }
}

#[async_trait]
impl TransactionLog for DiskStore {
    async fn append(&self, tx: Transaction) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = order_key(self.next_seq.fetch_add(1, Ordering::SeqCst));

        let mut batch = self.keyspace.batch();
        batch.insert(&self.transactions, key.clone(), encode(&tx)?);
        batch.insert(&self.transaction_index, tx.id.as_bytes().to_vec(), key);
        batch.commit().context("Failed to write transaction")?;
        debug!(id = %tx.id, "Transaction APPEND");
        self.persist()
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        self.transactions
            .iter()
            .map(|item| {
                let (_, value) = item?;
                decode(&value)
            })
            .collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Transaction>> {
        Ok(self.read_transaction(id)?.map(|(_, tx)| tx))
    }

    async fn set_status(&self, id: &str, status: TxStatus) -> Result<Option<Transaction>> {
        let _guard = self.write_lock.lock().await;
        let Some((key, mut tx)) = self.read_transaction(id)? else {
            return Ok(None);
        };
        tx.status = status;
        self.transactions.insert(key, encode(&tx)?)?;
        self.persist()?;
        Ok(Some(tx))
    }
}

#[async_trait]
impl CompanySettingsStore for DiskStore {
    async fn get(&self) -> Result<CompanySettings> {
        Ok(self
            .company
            .get(SETTINGS_KEY)?
            .map(|bytes| decode(&bytes))
            .transpose()?
            .unwrap_or_default())
    }

    async fn put(&self, settings: CompanySettings) -> Result<CompanySettings> {
        let normalized = settings.normalized();
        let _guard = self.write_lock.lock().await;
        self.company
            .insert(SETTINGS_KEY.as_bytes().to_vec(), encode(&normalized)?)?;
        self.persist()?;
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FiatCurrency;
    use chrono::Utc;
    use tempfile::tempdir;

    fn tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: Utc::now(),
            fiat_amount: 150.0,
            fiat_currency: FiatCurrency::Eur,
            crypto_symbol: CryptoSymbol::Eth,
            crypto_amount: 0.05,
            num_employees: 2,
            addresses: vec!["0xa".to_string(), "0xb".to_string()],
            tx_hash: Some("0xhash".to_string()),
            status: TxStatus::Pending,
            price_at_tx: 3000.0,
            per_employee_breakdown: None,
        }
    }

    #[test]
    fn test_order_key_roundtrip_and_ordering() {
        assert_eq!(seq_from_key(&order_key(7)).unwrap(), 7);
        assert!(order_key(8) < order_key(7));
        assert!(seq_from_key(&[1, 2, 3]).is_err());
    }

    #[tokio::test]
    async fn test_employees_roundtrip() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        let mut emp = Employee::new("marie.roy");
        emp.gross_salary = 2100.0;
        store.upsert(emp.clone()).await.unwrap();
        store.upsert(Employee::new("alex.morin")).await.unwrap();

        let loaded = EmployeeStore::get(&store, "marie.roy").await.unwrap().unwrap();
        assert_eq!(loaded, emp);
        let ids: Vec<String> = EmployeeStore::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.user_id)
            .collect();
        assert_eq!(ids, vec!["alex.morin", "marie.roy"]);
    }

    #[tokio::test]
    async fn test_accumulation_and_status_updates() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        store.upsert(Employee::new("lea")).await.unwrap();

        store
            .apply_accumulation("lea", CryptoSymbol::Btc, 50.0, 0.001)
            .await
            .unwrap();
        let emp = store
            .apply_accumulation("lea", CryptoSymbol::Btc, 25.0, 0.0005)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(emp.accumulated_fiat, 75.0);
        assert!((emp.accumulated(CryptoSymbol::Btc) - 0.0015).abs() < 1e-12);
        assert!(
            store
                .apply_accumulation("ghost", CryptoSymbol::Btc, 1.0, 1.0)
                .await
                .unwrap()
                .is_none()
        );

        store.append(tx("t1")).await.unwrap();
        let confirmed = store
            .set_status("t1", TxStatus::Confirmed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.status, TxStatus::Confirmed);
        assert!(store.set_status("t2", TxStatus::Confirmed).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskStore::open(dir.path()).unwrap();
            store.upsert(Employee::new("alex")).await.unwrap();
            store.append(tx("older")).await.unwrap();
            store.append(tx("newer")).await.unwrap();
            let mut settings = CompanySettings::default();
            settings.custody = true;
            settings.base_fiat = FiatCurrency::Cad;
            store.put(settings).await.unwrap();
        }

        let store = DiskStore::open(dir.path()).unwrap();
        assert!(EmployeeStore::get(&store, "alex").await.unwrap().is_some());
        let settings = CompanySettingsStore::get(&store).await.unwrap();
        assert!(settings.custody);
        assert_eq!(settings.base_fiat, FiatCurrency::Cad);

        // Sequence numbering resumes after reopen, keeping newest-first order.
        store.append(tx("newest")).await.unwrap();
        let ids: Vec<String> = TransactionLog::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["newest", "newer", "older"]);
        let older = TransactionLog::get(&store, "older").await.unwrap().unwrap();
        assert_eq!(older.tx_hash.as_deref(), Some("0xhash"));
    }

    #[tokio::test]
    async fn test_settings_default_when_unset() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(
            CompanySettingsStore::get(&store).await.unwrap(),
            CompanySettings::default()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_merge_upsert_keeps_concurrent_accumulations() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(DiskStore::open(dir.path()).unwrap());
        let (_, created) = store.merge_upsert(EmployeeUpdate::new("lea")).await.unwrap();
        assert!(created);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut update = EmployeeUpdate::new("lea");
                    update.first_name = Some(format!("Lea {i}"));
                    let (merged, accumulated) = tokio::join!(
                        store.merge_upsert(update),
                        store.apply_accumulation("lea", CryptoSymbol::Eth, 5.0, 0.002),
                    );
                    assert!(!merged.unwrap().1);
                    accumulated.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let emp = EmployeeStore::get(&*store, "lea").await.unwrap().unwrap();
        assert_eq!(emp.accumulated_fiat, 100.0);
        assert!((emp.accumulated(CryptoSymbol::Eth) - 0.04).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_merge_upsert_rejects_invalid_without_writing() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        let mut update = EmployeeUpdate::new("kim");
        update
            .receiving_addresses
            .insert(CryptoSymbol::Btc, Some("bc1qkim".to_string()));
        update.crypto_split.insert(CryptoSymbol::Btc, 60);
        let err = store.merge_upsert(update).await.unwrap_err();

        assert!(matches!(err, crate::core::PayrollError::Validation(_)));
        assert!(EmployeeStore::get(&store, "kim").await.unwrap().is_none());
    }
}
