//! Core payroll abstractions and domain types

pub mod asset;
pub mod broker;
pub mod company;
pub mod config;
pub mod employee;
pub mod error;
pub mod log;
pub mod money;
pub mod price;
pub mod store;
pub mod transaction;

pub use asset::{CryptoSymbol, FiatCurrency};
pub use broker::{BrokerClient, DistributionOrder};
pub use company::CompanySettings;
pub use employee::{ConvertMode, Employee, EmployeeUpdate};
pub use error::{IneligibleReason, PayrollError};
pub use price::{PriceProvider, PriceQuote};
pub use store::{CompanySettingsStore, EmployeeStore, TransactionLog};
pub use transaction::{BreakdownEntry, Transaction, TxStatus};
