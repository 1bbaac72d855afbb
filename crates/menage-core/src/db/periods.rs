//! Closed-period boundaries

use rusqlite::params;

use super::{parse_date, Database};
use crate::error::{Error, Result};
use crate::models::{PeriodClosure, YearMonth};

impl Database {
    /// Record (or replace) the boundaries of a closed month
    pub fn close_period(&self, owner: &str, closure: &PeriodClosure) -> Result<()> {
        if closure.start > closure.end {
            return Err(Error::InvalidInput(format!(
                "Period {} starts after it ends ({} > {})",
                closure.month, closure.start, closure.end
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO period_closures (owner, month, start_date, end_date)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(owner, month) DO UPDATE SET
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                closed_at = CURRENT_TIMESTAMP
            "#,
            params![
                owner,
                closure.month.to_string(),
                closure.start.to_string(),
                closure.end.to_string(),
            ],
        )?;

        Ok(())
    }

    /// Remove a month's closure; returns false if it was not closed
    pub fn reopen_period(&self, owner: &str, month: YearMonth) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM period_closures WHERE owner = ? AND month = ?",
            params![owner, month.to_string()],
        )?;
        Ok(deleted > 0)
    }

    /// A user's closures, most recent month first
    pub fn list_period_closures(&self, owner: &str) -> Result<Vec<PeriodClosure>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT month, start_date, end_date FROM period_closures
            WHERE owner = ?
            ORDER BY month DESC
            "#,
        )?;

        let closures = stmt
            .query_map(params![owner], |row| {
                let month_str: String = row.get(0)?;
                let start_str: String = row.get(1)?;
                let end_str: String = row.get(2)?;

                let month = month_str.parse().map_err(|e: String| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?;

                Ok(PeriodClosure {
                    month,
                    start: parse_date(1, &start_str)?,
                    end: parse_date(2, &end_str)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(closures)
    }
}
