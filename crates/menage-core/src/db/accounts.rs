//! Account operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Account, AccountKind};

impl Database {
    /// Create or get an account by owner and name
    pub fn upsert_account(&self, owner: &str, name: &str, kind: AccountKind) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM accounts WHERE owner = ? AND name = ?",
                params![owner, name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO accounts (owner, name, kind) VALUES (?, ?, ?)",
            params![owner, name, kind.as_str()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List a user's accounts
    pub fn list_accounts(&self, owner: &str) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner, name, kind, created_at FROM accounts WHERE owner = ? ORDER BY name",
        )?;

        let accounts = stmt
            .query_map(params![owner], |row| {
                let kind_str: String = row.get(3)?;
                let created_at_str: String = row.get(4)?;

                Ok(Account {
                    id: row.get(0)?,
                    owner: row.get(1)?,
                    name: row.get(2)?,
                    kind: kind_str.parse().unwrap_or_default(),
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Find a user's account by name
    pub fn find_account(&self, owner: &str, name: &str) -> Result<Option<Account>> {
        Ok(self
            .list_accounts(owner)?
            .into_iter()
            .find(|a| a.name == name))
    }

    /// Number of accounts owned by a user
    pub fn count_accounts(&self, owner: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE owner = ?",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
