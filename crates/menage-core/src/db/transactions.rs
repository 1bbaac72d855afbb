//! Transaction operations

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_date, Database};
use crate::error::Result;
use crate::models::{DateRange, NewTransaction, TransactionRecord};

impl Database {
    /// Insert a transaction (skips duplicates based on import_hash)
    ///
    /// Duplicates are detected per account. Returns the new row id, or
    /// `None` when the row was already imported into this account.
    pub fn insert_transaction(&self, account_id: i64, tx: &NewTransaction) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE account_id = ? AND import_hash = ?",
                params![account_id, tx.import_hash],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Ok(None);
        }

        conn.execute(
            r#"
            INSERT INTO transactions (account_id, date, description, amount, kind, category, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                account_id,
                tx.date.to_string(),
                tx.description,
                tx.amount.abs(),
                tx.kind.as_str(),
                tx.category,
                tx.import_hash,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// Number of transactions across a user's accounts
    pub fn count_transactions(&self, owner: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM transactions t
            JOIN accounts a ON a.id = t.account_id
            WHERE a.owner = ?
            "#,
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of transactions in one account
    pub fn count_transactions_in_account(&self, account_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE account_id = ?",
            params![account_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Date of a user's earliest transaction
    pub fn earliest_transaction_date(&self, owner: &str) -> Result<Option<NaiveDate>> {
        let conn = self.conn()?;
        let first: Option<String> = conn.query_row(
            r#"
            SELECT MIN(t.date) FROM transactions t
            JOIN accounts a ON a.id = t.account_id
            WHERE a.owner = ?
            "#,
            params![owner],
            |row| row.get(0),
        )?;

        first
            .map(|s| parse_date(0, &s))
            .transpose()
            .map_err(Into::into)
    }

    /// Transactions for a user falling in any of `ranges`
    ///
    /// Runs one query per range; rows matched by overlapping ranges are
    /// returned once.
    pub fn records_in_ranges(
        &self,
        owner: &str,
        ranges: &[DateRange],
    ) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.date, t.amount, t.kind, t.category
            FROM transactions t
            JOIN accounts a ON a.id = t.account_id
            WHERE a.owner = ? AND t.date >= ? AND t.date <= ?
            ORDER BY t.date, t.id
            "#,
        )?;

        let mut seen = BTreeSet::new();
        let mut records = Vec::new();

        for range in ranges {
            let rows = stmt
                .query_map(
                    params![owner, range.start.to_string(), range.end.to_string()],
                    |row| {
                        let id: i64 = row.get(0)?;
                        let date_str: String = row.get(1)?;
                        let kind_str: String = row.get(3)?;
                        let kind = kind_str.parse().map_err(|e: String| {
                            rusqlite::Error::FromSqlConversionFailure(
                                3,
                                rusqlite::types::Type::Text,
                                e.into(),
                            )
                        })?;

                        Ok((
                            id,
                            TransactionRecord {
                                amount: row.get(2)?,
                                date: parse_date(1, &date_str)?,
                                kind,
                                category: row.get(4)?,
                            },
                        ))
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            records.extend(
                rows.into_iter()
                    .filter(|(id, _)| seen.insert(*id))
                    .map(|(_, record)| record),
            );
        }

        Ok(records)
    }
}
