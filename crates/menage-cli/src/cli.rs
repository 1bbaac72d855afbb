//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ménage - Monthly budget recommendations from your own history
#[derive(Parser)]
#[command(name = "menage")]
#[command(about = "Self-hosted household budget planner", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "menage.db", global = true)]
    pub db: PathBuf,

    /// User identity that owns accounts, periods and targets
    #[arg(long, default_value = "local-dev", global = true)]
    pub user: String,

    /// Recommendation engine config (TOML); defaults to the user config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// List or add accounts
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Import transactions from CSV
    ///
    /// Columns: date, description, amount, optional kind and category.
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Account name (created if missing)
        #[arg(short, long)]
        account: String,
    },

    /// Manage closed-period boundaries
    Periods {
        #[command(subcommand)]
        action: Option<PeriodsAction>,
    },

    /// Manage stored category targets
    Targets {
        #[command(subcommand)]
        action: Option<TargetsAction>,
    },

    /// Compute monthly budget recommendations
    Recommend {
        /// Number of completed months to analyze
        #[arg(short, long)]
        months: Option<i64>,

        /// Reference month (YYYY-MM); defaults to the current month
        #[arg(long)]
        month: Option<String>,

        /// Fraction of income to set aside (0 to 1)
        #[arg(short, long)]
        savings_rate: Option<f64>,

        /// Per-category target for this run only (CATEGORY=AMOUNT, repeatable)
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires Cloudflare Access headers or an API
        /// key from MENAGE_API_KEYS.
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// Add an account
    Add {
        /// Account name
        name: String,

        /// checking, savings, credit or cash
        #[arg(short, long, default_value = "checking")]
        kind: String,
    },
}

#[derive(Subcommand)]
pub enum PeriodsAction {
    /// Close a month on custom boundaries
    Close {
        /// Month to close (YYYY-MM)
        month: String,

        /// First day of the period (YYYY-MM-DD); defaults to the 1st
        #[arg(long)]
        start: Option<String>,

        /// Last day of the period (YYYY-MM-DD); defaults to the month end
        #[arg(long)]
        end: Option<String>,
    },

    /// Reopen a month (back to calendar bounds)
    Reopen {
        /// Month to reopen (YYYY-MM)
        month: String,
    },
}

#[derive(Subcommand)]
pub enum TargetsAction {
    /// Set a monthly target
    Set {
        /// Category name
        category: String,

        /// Monthly amount
        amount: f64,
    },

    /// Clear a monthly target
    Clear {
        /// Category name
        category: String,
    },
}
