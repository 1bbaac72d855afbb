//! Account commands

use anyhow::{anyhow, Result};
use menage_core::db::Database;
use menage_core::models::AccountKind;

pub fn cmd_accounts_list(db: &Database, user: &str) -> Result<()> {
    let accounts = db.list_accounts(user)?;

    if accounts.is_empty() {
        println!("No accounts for {}. Add one with: menage accounts add NAME", user);
        return Ok(());
    }

    println!("🏦 Accounts for {}:", user);
    for account in accounts {
        let count = db.count_transactions_in_account(account.id)?;
        println!(
            "   [{}] {} ({}) - {} transactions",
            account.id, account.name, account.kind, count
        );
    }

    Ok(())
}

pub fn cmd_accounts_add(db: &Database, user: &str, name: &str, kind: &str) -> Result<()> {
    let kind: AccountKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let id = db.upsert_account(user, name.trim(), kind)?;
    println!("✅ Account '{}' ready (id {})", name.trim(), id);
    Ok(())
}
