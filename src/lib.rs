pub mod broker;
pub mod cli;
pub mod contribution;
pub mod core;
pub mod payroll;
pub mod price_resolver;
pub mod providers;
pub mod roster;
pub mod store;

use crate::broker::MockBroker;
use crate::core::config::AppConfig;
use crate::payroll::PayrollAggregator;
use crate::price_resolver::PriceResolver;
use crate::store::DiskStore;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need the loaded configuration. `setup` is handled by the binary.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Supported,
    Prices {
        fiat: String,
    },
    Company,
    SetCompany {
        custody: bool,
        wallets: Vec<String>,
        base_fiat: Option<String>,
    },
    Employees,
    Upsert {
        file: PathBuf,
    },
    Run {
        symbol: String,
        total: Option<f64>,
    },
    Transactions,
    Confirm {
        id: String,
    },
}

fn price_resolver(config: &AppConfig) -> Result<Arc<PriceResolver>> {
    let chain = providers::price_chain(&config.providers)?;
    Ok(Arc::new(PriceResolver::new(chain)))
}

fn open_store(config: &AppConfig) -> Result<Arc<DiskStore>> {
    Ok(Arc::new(store::open_disk_store(config)?))
}

fn build_aggregator(config: &AppConfig, store: Arc<DiskStore>) -> Result<PayrollAggregator> {
    Ok(PayrollAggregator::new(
        store.clone(),
        store.clone(),
        store,
        price_resolver(config)?,
        Arc::new(MockBroker::new(&config.broker)?),
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coinpayroll starting...");

    let config = AppConfig::load(config_path)?;
    debug!(
        data_path = ?config.data_path,
        timeout_secs = config.providers.timeout_secs,
        "Loaded config"
    );

    match command {
        AppCommand::Supported => {
            println!("{}", cli::prices::display_supported());
            Ok(())
        }
        AppCommand::Prices { fiat } => cli::prices::run(&*price_resolver(&config)?, &fiat).await,
        AppCommand::Company => cli::company::show(&*open_store(&config)?).await,
        AppCommand::SetCompany {
            custody,
            wallets,
            base_fiat,
        } => {
            let settings =
                cli::company::settings_from_args(custody, &wallets, base_fiat.as_deref())?;
            cli::company::set(&*open_store(&config)?, settings).await
        }
        AppCommand::Employees => cli::employees::list(&*open_store(&config)?).await,
        AppCommand::Upsert { file } => {
            cli::employees::upsert(&*open_store(&config)?, &file).await
        }
        AppCommand::Run { symbol, total } => {
            let aggregator = build_aggregator(&config, open_store(&config)?)?;
            cli::payroll::run(&aggregator, &symbol, total).await
        }
        AppCommand::Transactions => cli::payroll::list(&*open_store(&config)?).await,
        AppCommand::Confirm { id } => {
            let aggregator = build_aggregator(&config, open_store(&config)?)?;
            cli::payroll::confirm(&aggregator, &id).await
        }
    }
}
