//! Category target commands

use anyhow::{bail, Result};
use menage_core::db::Database;

pub fn cmd_targets_list(db: &Database, user: &str) -> Result<()> {
    let targets = db.list_category_targets(user)?;

    if targets.is_empty() {
        println!("No targets set.");
        return Ok(());
    }

    println!("🎯 Monthly targets:");
    for (category, amount) in targets {
        println!("   {:<30} {:>10.2}", category, amount);
    }

    Ok(())
}

pub fn cmd_targets_set(db: &Database, user: &str, category: &str, amount: f64) -> Result<()> {
    db.set_category_target(user, category, amount)?;
    println!("✅ Target for {} set to {:.2}", category.trim(), amount);
    Ok(())
}

pub fn cmd_targets_clear(db: &Database, user: &str, category: &str) -> Result<()> {
    if !db.clear_category_target(user, category)? {
        bail!("No target set for {}", category);
    }
    println!("✅ Cleared target for {}", category.trim());
    Ok(())
}
