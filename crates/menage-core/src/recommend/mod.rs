//! Monthly budget recommendations
//!
//! Given one user's transaction history, the pipeline:
//! - resolves which historical months to analyze (`period`)
//! - groups expenses by category (`aggregate`)
//! - splits categories into fixed and variable (`classify`)
//! - allocates a savings-adjusted cap across categories (`allocate`)
//! - rounds, sorts and assembles the response (`present`)
//!
//! `BudgetEngine` drives the pipeline against any `TransactionSource`.

mod aggregate;
mod allocate;
mod classify;
mod engine;
mod period;
mod present;
mod types;

pub use aggregate::{aggregate, Aggregation, CategoryStats};
pub use allocate::{
    Allocation, AllocationInput, AllocationOutcome, Allocator, BudgetLine,
};
pub use classify::{CategoryClass, Classifier};
pub use engine::{BudgetEngine, TransactionSource};
pub use period::{resolve_periods, ResolvedPeriods};
pub use present::present;
pub use types::{
    sanitize_target, BudgetRecommendation, CategoryBudget, RecommendParams, RecommendRequest,
    RecommendationMeta,
};

/// Round a monetary amount to cents
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Divisor for monthly averages; never zero
pub(crate) fn months_divisor(months: usize) -> f64 {
    months.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(-3.456), -3.46);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_months_divisor() {
        assert_eq!(months_divisor(0), 1.0);
        assert_eq!(months_divisor(1), 1.0);
        assert_eq!(months_divisor(6), 6.0);
    }
}
