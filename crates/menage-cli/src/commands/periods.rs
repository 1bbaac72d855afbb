//! Closed-period commands

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use menage_core::db::Database;
use menage_core::models::{PeriodClosure, YearMonth};

pub fn cmd_periods_list(db: &Database, user: &str) -> Result<()> {
    let closures = db.list_period_closures(user)?;

    if closures.is_empty() {
        println!("No closed periods; calendar months are used.");
        return Ok(());
    }

    println!("📅 Closed periods:");
    for closure in closures {
        println!("   {}  {} → {}", closure.month, closure.start, closure.end);
    }

    Ok(())
}

pub fn cmd_periods_close(
    db: &Database,
    user: &str,
    month: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let month: YearMonth = month.parse().map_err(|e: String| anyhow!(e))?;
    let calendar = month.calendar_range();

    let closure = PeriodClosure {
        month,
        start: start.map(parse_day).transpose()?.unwrap_or(calendar.start),
        end: end.map(parse_day).transpose()?.unwrap_or(calendar.end),
    };

    db.close_period(user, &closure)?;
    println!(
        "✅ Closed {} ({} → {})",
        closure.month, closure.start, closure.end
    );
    Ok(())
}

pub fn cmd_periods_reopen(db: &Database, user: &str, month: &str) -> Result<()> {
    let month: YearMonth = month.parse().map_err(|e: String| anyhow!(e))?;

    if !db.reopen_period(user, month)? {
        bail!("Period {} is not closed", month);
    }

    println!("✅ Reopened {}", month);
    Ok(())
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", s))
}
