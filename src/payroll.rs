//! Payroll runs and transaction confirmation.
//!
//! A run moves through [`RunStage`]s in order and either ends `Recorded` or stops in
//! `Failed`. Nothing is written before the breakdown and totals are final: the
//! transaction is appended first, then each employee's accumulation is applied on its own.

use crate::contribution::contribution;
use crate::core::error::{IneligibleReason, PayrollError, Result};
use crate::core::money::{CRYPTO_DP, FIAT_DP, round_dp};
use crate::core::{
    BreakdownEntry, BrokerClient, CompanySettingsStore, CryptoSymbol, DistributionOrder,
    Employee, EmployeeStore, Transaction, TransactionLog, TxStatus,
};
use crate::price_resolver::PriceResolver;
use chrono::Utc;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Initiated,
    PriceResolved,
    EligibleSetBuilt,
    Disbursed,
    Recorded,
    Failed,
}

impl Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunStage::Initiated => "initiated",
            RunStage::PriceResolved => "price_resolved",
            RunStage::EligibleSetBuilt => "eligible_set_built",
            RunStage::Disbursed => "disbursed",
            RunStage::Recorded => "recorded",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(stage: &mut RunStage, next: RunStage) {
    debug!(from = %stage, to = %next, "Payroll run stage");
    *stage = next;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayrollRequest {
    pub crypto_symbol: CryptoSymbol,
    /// Informational; the disbursed total is always computed from contributions.
    pub payroll_fiat_total: Option<f64>,
}

impl PayrollRequest {
    pub fn new(crypto_symbol: CryptoSymbol) -> Self {
        PayrollRequest {
            crypto_symbol,
            payroll_fiat_total: None,
        }
    }

    /// Parses a user-supplied symbol; unknown symbols are `UnsupportedSymbol`.
    pub fn parse(symbol: &str, payroll_fiat_total: Option<f64>) -> Result<Self> {
        Ok(PayrollRequest {
            crypto_symbol: symbol.parse()?,
            payroll_fiat_total,
        })
    }

    pub fn validate(&self) -> Result<()> {
        match self.payroll_fiat_total {
            Some(total) if !total.is_finite() || total <= 0.0 => Err(PayrollError::Validation(
                format!("payroll_fiat_total must be a positive amount (got {total})"),
            )),
            _ => Ok(()),
        }
    }
}

/// Builds the per-employee entries for one symbol, in the order `employees` are given.
///
/// In custody mode every positive contribution is paid into the company wallet; otherwise
/// only employees with an address for the symbol are included. A positive contribution
/// below half a cent is kept with a zero fiat amount.
pub fn build_breakdown(
    employees: &[Employee],
    symbol: CryptoSymbol,
    custody: bool,
    price: f64,
) -> Result<Vec<BreakdownEntry>> {
    let entries: Vec<BreakdownEntry> = employees
        .iter()
        .filter_map(|employee| {
            let raw = contribution(employee, symbol);
            if raw <= 0.0 {
                return None;
            }
            let fiat_amount = round_dp(raw, FIAT_DP);
            let address = if custody {
                None
            } else {
                Some(employee.receiving_address(symbol)?.to_string())
            };
            Some(BreakdownEntry {
                user_id: employee.user_id.clone(),
                fiat_amount,
                crypto_amount: round_dp(fiat_amount / price, CRYPTO_DP),
                address,
            })
        })
        .collect();

    if entries.is_empty() {
        let reason = if custody {
            IneligibleReason::NoRequests
        } else {
            IneligibleReason::NoValidAddresses
        };
        return Err(PayrollError::NoEligibleRequests(reason));
    }
    Ok(entries)
}

pub struct PayrollAggregator {
    employees: Arc<dyn EmployeeStore>,
    transactions: Arc<dyn TransactionLog>,
    settings: Arc<dyn CompanySettingsStore>,
    resolver: Arc<PriceResolver>,
    broker: Arc<dyn BrokerClient>,
}

impl PayrollAggregator {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        transactions: Arc<dyn TransactionLog>,
        settings: Arc<dyn CompanySettingsStore>,
        resolver: Arc<PriceResolver>,
        broker: Arc<dyn BrokerClient>,
    ) -> Self {
        Self {
            employees,
            transactions,
            settings,
            resolver,
            broker,
        }
    }

    /// Executes one payroll run for the requested symbol and returns the recorded
    /// transaction.
    #[instrument(name = "RunPayroll", skip(self, request), fields(symbol = %request.crypto_symbol))]
    pub async fn run(&self, request: PayrollRequest) -> Result<Transaction> {
        let mut stage = RunStage::Initiated;
        let result = self.execute(&request, &mut stage).await;
        if let Err(e) = &result {
            warn!(failed_after = %stage, error = %e, "Payroll run failed");
            enter(&mut stage, RunStage::Failed);
        }
        result
    }

    async fn execute(&self, request: &PayrollRequest, stage: &mut RunStage) -> Result<Transaction> {
        request.validate()?;
        let symbol = request.crypto_symbol;
        let settings = self.settings.get().await?;
        let fiat = settings.base_fiat;

        let price = self.resolver.resolve_one(fiat, symbol).await?;
        enter(stage, RunStage::PriceResolved);

        let custody_wallet = if settings.custody {
            let wallet = settings
                .wallet(symbol)
                .ok_or(PayrollError::WalletMissing(symbol))?;
            Some(wallet.to_string())
        } else {
            None
        };

        let employees = self.employees.list().await?;
        let breakdown = build_breakdown(&employees, symbol, settings.custody, price)?;
        enter(stage, RunStage::EligibleSetBuilt);

        let fiat_total = round_dp(breakdown.iter().map(|e| e.fiat_amount).sum(), FIAT_DP);
        let crypto_total = fiat_total / price;
        let addresses = match custody_wallet {
            Some(wallet) => vec![wallet],
            None => breakdown
                .iter()
                .filter_map(|e| e.address.clone())
                .collect(),
        };
        if let Some(requested) = request.payroll_fiat_total
            && (requested - fiat_total).abs() >= 0.01
        {
            info!(
                requested,
                computed = fiat_total,
                "Requested total differs from employee contributions, using contributions"
            );
        }

        let order = DistributionOrder {
            fiat_total,
            fiat_currency: fiat,
            symbol,
            crypto_total,
            addresses,
        };
        let tx_hash = match self.broker.distribute(&order).await {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(error = %e, "Broker call failed, recording transaction without hash");
                None
            }
        };
        enter(stage, RunStage::Disbursed);

        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            date: Utc::now(),
            fiat_amount: fiat_total,
            fiat_currency: fiat,
            crypto_symbol: symbol,
            crypto_amount: crypto_total,
            num_employees: breakdown.len(),
            addresses: order.addresses,
            tx_hash,
            status: TxStatus::Pending,
            price_at_tx: price,
            per_employee_breakdown: Some(breakdown),
        };
        self.transactions.append(tx.clone()).await?;

        for entry in tx.breakdown() {
            match self
                .employees
                .apply_accumulation(&entry.user_id, symbol, entry.fiat_amount, entry.crypto_amount)
                .await
            {
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!(user_id = %entry.user_id, "Employee disappeared before accumulation")
                }
                Err(e) => {
                    warn!(user_id = %entry.user_id, error = %e, "Failed to apply accumulation")
                }
            }
        }
        enter(stage, RunStage::Recorded);

        info!(
            id = %tx.id,
            fiat_total,
            crypto_total,
            employees = tx.num_employees,
            "Payroll run recorded"
        );
        Ok(tx)
    }

    /// Marks a transaction confirmed. Confirming twice returns the record unchanged.
    #[instrument(name = "ConfirmTransaction", skip(self))]
    pub async fn confirm(&self, id: &str) -> Result<Transaction> {
        let Some(existing) = self.transactions.get(id).await? else {
            return Err(PayrollError::NotFound(id.to_string()));
        };
        if existing.status == TxStatus::Confirmed {
            debug!("Transaction already confirmed");
            return Ok(existing);
        }
        self.transactions
            .set_status(id, TxStatus::Confirmed)
            .await?
            .ok_or_else(|| PayrollError::NotFound(id.to_string()))
    }
}
