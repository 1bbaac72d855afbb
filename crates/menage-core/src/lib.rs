//! Ménage Core Library
//!
//! Shared functionality for the Ménage household budget tool:
//! - SQLite store for accounts, transactions, closed periods and targets
//! - CSV transaction import
//! - Monthly budget recommendation engine
//! - Engine configuration

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod recommend;

pub use config::RecommendConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use import::{import_csv, parse_csv, ImportSummary};
pub use recommend::{
    BudgetEngine, BudgetRecommendation, CategoryBudget, RecommendRequest, RecommendationMeta,
    TransactionSource,
};
