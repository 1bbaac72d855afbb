//! CSV transaction import
//!
//! Expected header (case-insensitive, any column order):
//! `date,description,amount[,kind][,category]`
//!
//! Without a `kind` column the sign of `amount` decides: negative amounts
//! are expenses. Stored amounts are always magnitudes.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewTransaction, TransactionKind};

/// Outcome of importing a file into an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Rows already present (same import hash)
    pub duplicates: usize,
}

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    kind: Option<usize>,
    category: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        let required = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| Error::Import(format!("Missing '{}' column", name)))
        };

        Ok(Self {
            date: required("date")?,
            description: required("description")?,
            amount: required("amount")?,
            kind: index.get("kind").copied(),
            category: index.get("category").copied(),
        })
    }
}

/// Parse CSV data into transactions
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let row = line + 2;
        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::Import(format!("Row {}: missing {}", row, name)))
        };

        let date = parse_date(field(columns.date, "date")?)?;
        let description = field(columns.description, "description")?.to_string();
        let signed = parse_amount(field(columns.amount, "amount")?)?;

        let kind = match columns.kind.and_then(|i| record.get(i)).filter(|s| !s.is_empty()) {
            Some(k) => k
                .parse::<TransactionKind>()
                .map_err(|e| Error::Import(format!("Row {}: {}", row, e)))?,
            None if signed < 0.0 => TransactionKind::Expense,
            None => TransactionKind::Income,
        };

        let category = columns
            .category
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(String::from);

        let amount = signed.abs();
        let import_hash = generate_hash(&date, &description, amount, kind);

        transactions.push(NewTransaction {
            date,
            description,
            amount,
            kind,
            category,
            import_hash,
        });
    }

    debug!("Parsed {} transactions", transactions.len());
    Ok(transactions)
}

/// Parse a file and insert its rows into an account, skipping duplicates
pub fn import_csv<R: Read>(db: &Database, account_id: i64, reader: R) -> Result<ImportSummary> {
    let transactions = parse_csv(reader)?;
    let mut summary = ImportSummary::default();

    for tx in &transactions {
        match db.insert_transaction(account_id, tx)? {
            Some(_) => summary.imported += 1,
            None => summary.duplicates += 1,
        }
    }

    info!(
        account_id,
        imported = summary.imported,
        duplicates = summary.duplicates,
        "Imported transactions"
    );
    Ok(summary)
}

/// Generate a unique hash for deduplication
fn generate_hash(date: &NaiveDate, description: &str, amount: f64, kind: TransactionKind) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.update(kind.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse `YYYY-MM-DD` or `DD/MM/YYYY`
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount, accepting currency symbols and a decimal comma
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();

    // With both separators the last one is the decimal point:
    // "1.234,56" and "1,234.56". A lone comma is a decimal comma.
    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountKind;
    use crate::recommend::TransactionSource;

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("15/01/2024").unwrap(), expected);
        assert!(parse_date("Jan 15").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("-1 234,56 €").unwrap(), -1234.56);
        assert_eq!(parse_amount("42").unwrap(), 42.0);
        assert_eq!(parse_amount("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_amount("-1.234,56 €").unwrap(), -1234.56);
        assert_eq!(parse_amount("12,5").unwrap(), 12.5);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_sign_decides_kind_without_kind_column() {
        let csv = "Date,Description,Amount,Category
2024-03-01,SALAIRE,3000.00,
2024-03-02,CARREFOUR,-82.40,Alimentation";

        let transactions = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].kind, TransactionKind::Income);
        assert_eq!(transactions[0].category, None);
        assert_eq!(transactions[1].kind, TransactionKind::Expense);
        assert_eq!(transactions[1].amount, 82.40);
        assert_eq!(transactions[1].category.as_deref(), Some("Alimentation"));
    }

    #[test]
    fn test_kind_column_wins_over_sign() {
        let csv = "category,kind,amount,description,date
Loisirs,expense,25,CINEMA,05/03/2024
,income,-10,REMBOURSEMENT,06/03/2024";

        let transactions = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(transactions[0].kind, TransactionKind::Expense);
        assert_eq!(transactions[0].amount, 25.0);
        assert_eq!(transactions[1].kind, TransactionKind::Income);
        assert_eq!(transactions[1].amount, 10.0);
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "date,amount\n2024-03-01,10";
        assert!(matches!(parse_csv(csv.as_bytes()), Err(Error::Import(_))));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let csv = "date,description,amount\n2024-03-01,OK,10\nnot-a-date,BAD,5";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("not-a-date"), "{}", err);
    }

    #[test]
    fn test_import_skips_duplicates() {
        let db = Database::in_memory().unwrap();
        let account = db
            .upsert_account("alice", "Main", AccountKind::Checking)
            .unwrap();
        let csv = "date,description,amount\n2024-03-01,SALAIRE,3000\n2024-03-02,LOYER,-900";

        let first = import_csv(&db, account, csv.as_bytes()).unwrap();
        assert_eq!(first, ImportSummary { imported: 2, duplicates: 0 });

        let second = import_csv(&db, account, csv.as_bytes()).unwrap();
        assert_eq!(second, ImportSummary { imported: 0, duplicates: 2 });

        assert_eq!(
            db.first_transaction_date("alice").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }
}
