//! Turns an allocation into the response shape

use std::cmp::Ordering;

use super::allocate::{Allocation, AllocationOutcome, BudgetLine};
use super::period::ResolvedPeriods;
use super::types::{BudgetRecommendation, CategoryBudget, RecommendationMeta};
use super::{months_divisor, round2};

/// Round, sort and attach metadata
///
/// An infeasible allocation keeps only its fixed categories and carries an
/// `error` message instead of variable budgets.
pub fn present(
    allocation: &Allocation,
    periods: &ResolvedPeriods,
    months_window: u32,
) -> BudgetRecommendation {
    let months = periods.actual_months();

    let (lines, error): (Vec<&BudgetLine>, _) = match allocation.outcome {
        AllocationOutcome::Allocated => (allocation.lines.iter().collect(), None),
        AllocationOutcome::Infeasible { shortfall } => (
            allocation.fixed_lines().collect(),
            Some(format!(
                "Fixed expenses ({:.2}) exceed the available budget ({:.2}) by {:.2}",
                allocation.fixed_total,
                round2(allocation.cap),
                shortfall
            )),
        ),
    };

    let mut budgets: Vec<CategoryBudget> = lines
        .into_iter()
        .map(|line| category_budget(line, months))
        .collect();
    budgets.sort_by(by_total_then_name);

    BudgetRecommendation {
        budgets,
        meta: RecommendationMeta {
            months_window,
            actual_months_analyzed: months,
            months_analyzed: periods.months.iter().map(|m| m.to_string()).collect(),
            effective_income: round2(allocation.effective_income),
            cap_disponible: round2(allocation.cap),
            fixed_total: round2(allocation.fixed_total),
        },
        error,
    }
}

fn category_budget(line: &BudgetLine, months: usize) -> CategoryBudget {
    let stats = &line.stats;
    let is_fixed = line.is_fixed();

    CategoryBudget {
        category: line.category.clone(),
        total: round2(stats.total),
        avg_per_month: round2(stats.avg_per_month),
        median: round2(stats.median),
        realistic: round2(stats.median * stats.count as f64 / months_divisor(months)),
        is_fixed,
        is_essential: !is_fixed && line.essential,
        user_target: line.target.map(round2),
        base: if is_fixed { None } else { line.base.map(round2) },
        recommended_monthly: round2(line.recommended.max(0.0)),
    }
}

fn by_total_then_name(a: &CategoryBudget, b: &CategoryBudget) -> Ordering {
    b.total
        .total_cmp(&a.total)
        .then_with(|| a.category.cmp(&b.category))
}
