//! A personal-finance ledger engine.
//!
//! The engine owns two jobs: keeping each account's cached balance exactly
//! equal to the sum of its live transaction effects, and answering aggregate
//! questions (dashboard stats, monthly series, category breakdowns) from the
//! same data. Every operation runs inside a single database transaction.

pub use accounts::Account;
pub use categories::Category;
pub use commands::{CreateTransactionCmd, UpdateTransactionCmd};
pub use error::{EngineError, ErrorCategory};
pub use money::MoneyCents;
pub use ops::{BalanceDrift, Engine, EngineBuilder, TransactionListFilter, TransactionView};
pub use reports::{CategorySlice, DateRange, MonthlyReport, Stats};
pub use transactions::{Transaction, TransactionKind};

mod accounts;
mod categories;
mod commands;
mod error;
mod money;
mod ops;
mod reports;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
