//! Budget recommendation command

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use menage_core::db::Database;
use menage_core::{BudgetEngine, BudgetRecommendation, RecommendRequest};
use tracing::debug;

use super::truncate;

/// Build a request from CLI flags
///
/// Targets are `CATEGORY=AMOUNT`; the category may itself contain `=`, the
/// amount is taken after the last one.
pub fn build_request(
    months: Option<i64>,
    month: Option<String>,
    savings_rate: Option<f64>,
    targets: &[String],
) -> Result<RecommendRequest> {
    let mut parsed = BTreeMap::new();

    for target in targets {
        let Some((category, amount)) = target.rsplit_once('=') else {
            bail!("Invalid target '{}' (use CATEGORY=AMOUNT)", target);
        };
        let category = category.trim();
        if category.is_empty() {
            bail!("Invalid target '{}': empty category", target);
        }
        let amount: f64 = amount
            .trim()
            .parse()
            .with_context(|| format!("Invalid amount in target '{}'", target))?;
        parsed.insert(category.to_string(), serde_json::json!(amount));
    }

    Ok(RecommendRequest {
        months_window: months,
        selected_month: month,
        savings_rate,
        targets: parsed,
    })
}

pub fn cmd_recommend(
    db: &Database,
    engine: &BudgetEngine,
    user: &str,
    request: &RecommendRequest,
    json: bool,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let recommendation = engine
        .recommend(db, user, request, today)
        .context("Failed to compute recommendations")?;

    debug!(
        user,
        budgets = recommendation.budgets.len(),
        feasible = recommendation.is_feasible(),
        "Computed recommendations"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    } else {
        print!("{}", render_table(&recommendation));
    }

    Ok(())
}

/// Human-readable summary of a recommendation
pub fn render_table(rec: &BudgetRecommendation) -> String {
    let meta = &rec.meta;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "📊 Budget based on {} month(s): {}",
        meta.actual_months_analyzed,
        meta.months_analyzed.join(", ")
    );
    if (meta.actual_months_analyzed as u32) < meta.months_window {
        let _ = writeln!(
            out,
            "   (requested {}, history is shorter)",
            meta.months_window
        );
    }
    let _ = writeln!(out, "   Effective income:  {:>10.2}", meta.effective_income);
    let _ = writeln!(out, "   Spendable cap:     {:>10.2}", meta.cap_disponible);
    let _ = writeln!(out, "   Fixed expenses:    {:>10.2}", meta.fixed_total);
    let _ = writeln!(out);

    if let Some(error) = &rec.error {
        let _ = writeln!(out, "⚠️  {}", error);
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "   {:<28} {:<5} {:>10} {:>10} {:>12}",
        "Category", "Type", "Avg/month", "Target", "Recommended"
    );
    for budget in &rec.budgets {
        let kind = if budget.is_fixed {
            "fixed"
        } else if budget.is_essential {
            "ess."
        } else {
            "var."
        };
        let target = budget
            .user_target
            .map(|t| format!("{:.2}", t))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "   {:<28} {:<5} {:>10.2} {:>10} {:>12.2}",
            truncate(&budget.category, 28),
            kind,
            budget.avg_per_month,
            target,
            budget.recommended_monthly
        );
    }

    if rec.is_feasible() {
        let _ = writeln!(out);
        let _ = writeln!(out, "   Total recommended: {:>10.2}", rec.total_recommended());
    }

    out
}
