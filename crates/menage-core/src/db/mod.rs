//! SQLite store with connection pooling and migrations
//!
//! Organized by domain:
//! - `accounts` - user accounts
//! - `transactions` - imported transactions and range queries
//! - `periods` - closed-period boundaries
//! - `targets` - stored per-category monthly targets
//! - `audit` - API access log
//!
//! `Database` implements `TransactionSource`, so the recommendation engine
//! can read a user's history straight from the store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;
use crate::models::{DateRange, PeriodClosure, TransactionRecord};
use crate::recommend::TransactionSource;

mod accounts;
mod audit;
mod periods;
mod targets;
mod transactions;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a stored `YYYY-MM-DD` date column
pub(crate) fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "menage_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().into_owned();

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Accounts, owned by a user identity
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'checking',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(owner, name)
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_owner ON accounts(owner);

            -- Transactions; amounts are magnitudes, direction lives in kind
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                date DATE NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                category TEXT,
                import_hash TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(account_id, import_hash)
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);

            -- Closed periods: a month may close on a date other than its calendar end
            CREATE TABLE IF NOT EXISTS period_closures (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                month TEXT NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                closed_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(owner, month)
            );

            -- Stored monthly targets per category
            CREATE TABLE IF NOT EXISTS category_targets (
                owner TEXT NOT NULL,
                category TEXT NOT NULL,
                monthly_target REAL NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (owner, category)
            );

            -- Audit log (tracks all API access)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                user_email TEXT NOT NULL,
                action TEXT NOT NULL,
                entity_type TEXT,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_audit_log_user ON audit_log(user_email);
            CREATE INDEX IF NOT EXISTS idx_audit_log_timestamp ON audit_log(timestamp);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

impl TransactionSource for Database {
    fn has_accounts(&self, user: &str) -> Result<bool> {
        Ok(self.count_accounts(user)? > 0)
    }

    fn closed_periods(&self, user: &str) -> Result<Vec<PeriodClosure>> {
        self.list_period_closures(user)
    }

    fn first_transaction_date(&self, user: &str) -> Result<Option<NaiveDate>> {
        self.earliest_transaction_date(user)
    }

    fn transactions_in(&self, user: &str, ranges: &[DateRange]) -> Result<Vec<TransactionRecord>> {
        self.records_in_ranges(user, ranges)
    }

    fn category_targets(&self, user: &str) -> Result<BTreeMap<String, f64>> {
        self.list_category_targets(user)
    }
}
