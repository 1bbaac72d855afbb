//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_engine` - Build the recommendation engine from configuration
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use menage_core::{db::Database, BudgetEngine, RecommendConfig};

/// Open (and migrate) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

/// Build the engine from an explicit config file or the default locations
pub fn load_engine(config_path: Option<&Path>) -> Result<BudgetEngine> {
    let config = RecommendConfig::load_from(config_path)
        .context("Failed to load recommendation config")?;
    Ok(BudgetEngine::new(config))
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an account:         menage accounts add \"Compte courant\"");
    println!("  2. Import transactions:    menage import --file releve.csv --account \"Compte courant\"");
    println!("  3. Get recommendations:    menage recommend");

    Ok(())
}
