//! Import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use menage_core::db::Database;
use menage_core::import::{import_csv, ImportSummary};
use menage_core::models::AccountKind;

pub fn cmd_import(db: &Database, user: &str, file: &Path, account: &str) -> Result<ImportSummary> {
    println!("📥 Importing {}...", file.display());

    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;

    let account_id = match db.find_account(user, account)? {
        Some(existing) => existing.id,
        None => {
            println!("   Creating account '{}'", account);
            db.upsert_account(user, account, AccountKind::default())?
        }
    };

    let summary = import_csv(db, account_id, reader)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!(
        "✅ Imported {} transactions ({} duplicates skipped)",
        summary.imported, summary.duplicates
    );

    Ok(summary)
}
