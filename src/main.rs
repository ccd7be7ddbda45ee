use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinpayroll::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for coinpayroll::AppCommand {
    fn from(cmd: Commands) -> coinpayroll::AppCommand {
        use coinpayroll::AppCommand;
        match cmd {
            Commands::Supported => AppCommand::Supported,
            Commands::Prices { fiat } => AppCommand::Prices { fiat },
            Commands::Company => AppCommand::Company,
            Commands::SetCompany {
                custody,
                wallets,
                base_fiat,
            } => AppCommand::SetCompany {
                custody,
                wallets,
                base_fiat,
            },
            Commands::Employees => AppCommand::Employees,
            Commands::Upsert { file } => AppCommand::Upsert { file },
            Commands::Run { symbol, total } => AppCommand::Run { symbol, total },
            Commands::Transactions => AppCommand::Transactions,
            Commands::Confirm { id } => AppCommand::Confirm { id },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List supported crypto symbols and fiat currencies
    Supported,
    /// Show live crypto prices
    Prices {
        /// Fiat currency to quote in
        #[arg(long, default_value = "USD")]
        fiat: String,
    },
    /// Show company custody settings
    Company,
    /// Replace company custody settings
    SetCompany {
        /// Pay every run into the company wallet
        #[arg(long)]
        custody: bool,
        /// Company wallet for a symbol, repeatable
        #[arg(long = "wallet", value_name = "SYMBOL=ADDRESS")]
        wallets: Vec<String>,
        /// Base fiat for payroll runs; unsupported values fall back to USD
        #[arg(long)]
        base_fiat: Option<String>,
    },
    /// List employees
    Employees,
    /// Create or update an employee from a YAML or JSON file
    Upsert { file: PathBuf },
    /// Execute a payroll run for one crypto symbol
    Run {
        symbol: String,
        /// Expected fiat total, informational only
        #[arg(long)]
        total: Option<f64>,
    },
    /// List transactions, newest first
    Transactions,
    /// Confirm a pending transaction
    Confirm { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinpayroll::cli::setup::setup(),
        Some(cmd) => coinpayroll::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
