//! Stored category targets

use std::collections::BTreeMap;

use rusqlite::params;

use super::Database;
use crate::error::{Error, Result};

impl Database {
    /// Set a category's monthly target
    pub fn set_category_target(&self, owner: &str, category: &str, amount: f64) -> Result<()> {
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::InvalidInput("Category name is empty".to_string()));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Target for {} must be a non-negative amount (got {})",
                category, amount
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO category_targets (owner, category, monthly_target)
            VALUES (?, ?, ?)
            ON CONFLICT(owner, category) DO UPDATE SET
                monthly_target = excluded.monthly_target,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![owner, category, amount],
        )?;

        Ok(())
    }

    /// Clear a category's target; returns false if none was set
    pub fn clear_category_target(&self, owner: &str, category: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM category_targets WHERE owner = ? AND category = ?",
            params![owner, category.trim()],
        )?;
        Ok(deleted > 0)
    }

    /// A user's stored targets keyed by category
    pub fn list_category_targets(&self, owner: &str) -> Result<BTreeMap<String, f64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, monthly_target FROM category_targets WHERE owner = ?",
        )?;

        let targets = stmt
            .query_map(params![owner], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<BTreeMap<String, f64>, _>>()?;

        Ok(targets)
    }
}
