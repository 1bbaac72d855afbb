//! Per-category spending aggregation

use std::collections::BTreeMap;

use crate::models::{TransactionKind, TransactionRecord};

use super::months_divisor;

/// Spending statistics for one category over the analyzed window
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryStats {
    /// Sum of expense amounts
    pub total: f64,
    /// `total` divided by the number of analyzed months
    pub avg_per_month: f64,
    /// Median of the individual expense amounts
    pub median: f64,
    /// Number of expense transactions
    pub count: usize,
}

/// Result of grouping a transaction slice
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregation {
    /// Expense statistics keyed by category name
    pub categories: BTreeMap<String, CategoryStats>,
    pub total_income: f64,
    pub total_expenses: f64,
}

/// Group transactions by category
///
/// Income only feeds `total_income`. Expenses without a category (or with a
/// blank one) are grouped under `uncategorized`. Non-finite amounts count
/// as zero.
pub fn aggregate(records: &[TransactionRecord], months: usize, uncategorized: &str) -> Aggregation {
    let mut amounts: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut skipped = 0usize;

    for record in records {
        let amount = if record.amount.is_finite() {
            record.amount.abs()
        } else {
            skipped += 1;
            0.0
        };

        match record.kind {
            TransactionKind::Income => total_income += amount,
            TransactionKind::Expense => {
                total_expenses += amount;
                let category = record
                    .category
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(uncategorized);
                amounts
                    .entry(category.to_string())
                    .or_default()
                    .push(amount);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Ignored non-finite transaction amounts");
    }

    let divisor = months_divisor(months);
    let categories = amounts
        .into_iter()
        .map(|(name, values)| {
            let total: f64 = values.iter().sum();
            let stats = CategoryStats {
                total,
                avg_per_month: total / divisor,
                median: median(&values),
                count: values.len(),
            };
            (name, stats)
        })
        .collect();

    Aggregation {
        categories,
        total_income,
        total_expenses,
    }
}

/// Median of a slice, averaging the two middle values for even lengths
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[5.0]), 5.0);
        assert_eq!(median(&[9.0, 1.0, 5.0]), 5.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_median_does_not_mutate_input() {
        let values = vec![3.0, 1.0, 2.0];
        let _ = median(&values);
        assert_eq!(values, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_groups_expenses_by_category() {
        let records = vec![
            TransactionRecord::expense(100.0, day(2), "Alimentation"),
            TransactionRecord::expense(50.0, day(9), "Alimentation"),
            TransactionRecord::expense(30.0, day(12), "Loisirs"),
            TransactionRecord::expense(90.0, day(20), "Alimentation"),
            TransactionRecord::income(2000.0, day(1)),
        ];

        let agg = aggregate(&records, 2, "Uncategorized");

        assert_eq!(agg.total_income, 2000.0);
        assert_eq!(agg.total_expenses, 270.0);
        assert_eq!(agg.categories.len(), 2);

        let food = &agg.categories["Alimentation"];
        assert_eq!(food.total, 240.0);
        assert_eq!(food.avg_per_month, 120.0);
        assert_eq!(food.median, 90.0);
        assert_eq!(food.count, 3);
    }

    #[test]
    fn test_income_never_becomes_a_category() {
        let mut salary = TransactionRecord::income(3000.0, day(1));
        salary.category = Some("Salaire".to_string());

        let agg = aggregate(&[salary], 1, "Uncategorized");
        assert!(agg.categories.is_empty());
        assert_eq!(agg.total_income, 3000.0);
    }

    #[test]
    fn test_missing_category_uses_sentinel() {
        let mut blank = TransactionRecord::expense(12.0, day(3), "   ");
        let mut none = TransactionRecord::expense(8.0, day(4), "x");
        none.category = None;
        blank.amount = -12.0;

        let agg = aggregate(&[blank, none], 1, "Uncategorized");
        assert_eq!(agg.categories.len(), 1);
        assert_eq!(agg.categories["Uncategorized"].total, 20.0);
    }

    #[test]
    fn test_non_finite_amounts_count_as_zero() {
        let records = vec![
            TransactionRecord::expense(f64::NAN, day(1), "Loisirs"),
            TransactionRecord::expense(20.0, day(2), "Loisirs"),
        ];

        let agg = aggregate(&records, 1, "Uncategorized");
        let leisure = &agg.categories["Loisirs"];
        assert_eq!(leisure.total, 20.0);
        assert!(leisure.median.is_finite());
    }

    #[test]
    fn test_zero_months_does_not_divide_by_zero() {
        let records = vec![TransactionRecord::expense(40.0, day(5), "Loisirs")];
        let agg = aggregate(&records, 0, "Uncategorized");
        assert_eq!(agg.categories["Loisirs"].avg_per_month, 40.0);
    }
}
