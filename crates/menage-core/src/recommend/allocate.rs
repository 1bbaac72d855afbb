//! Budget allocation
//!
//! Turns aggregated spending into monthly recommendations:
//!
//! 1. effective income (average income, or expenses × fallback multiplier)
//! 2. spendable cap = effective income − savings
//! 3. fixed categories keep their target or average
//! 4. feasibility gate: fixed total above the cap stops here
//! 5. variable bases (target or average)
//! 6. ratio = min(1, available / Σ base)
//! 7. scale each variable base by the ratio
//! 8. floor every variable category at the minimum budget
//! 9. hand leftover budget to essential categories, weighted by base
//! 10. trim variable categories if the grand total overflows
//!
//! The order is significant: each step consumes the previous one's output.

use std::collections::BTreeMap;

use tracing::debug;

use super::aggregate::{Aggregation, CategoryStats};
use super::classify::{CategoryClass, Classifier};
use super::{months_divisor, round2};

/// Overflow below this is floating-point noise
const OVERFLOW_EPSILON: f64 = 1e-9;

/// Inputs to one allocation run
#[derive(Debug, Clone, Copy)]
pub struct AllocationInput<'a> {
    pub aggregation: &'a Aggregation,
    /// Months actually analyzed (divisor for averages)
    pub months: usize,
    pub savings_rate: f64,
    /// Sanitized per-category targets
    pub targets: &'a BTreeMap<String, f64>,
}

/// One category's allocation state
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLine {
    pub category: String,
    pub stats: CategoryStats,
    pub class: CategoryClass,
    pub essential: bool,
    pub target: Option<f64>,
    /// Allocation weight, set for variable categories once step 5 ran
    pub base: Option<f64>,
    pub recommended: f64,
}

impl BudgetLine {
    pub fn is_fixed(&self) -> bool {
        self.class == CategoryClass::Fixed
    }
}

/// Terminal state of an allocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllocationOutcome {
    /// Every category received a recommendation
    Allocated,
    /// Fixed expenses exceed the cap by `shortfall`; variable categories were not allocated
    Infeasible { shortfall: f64 },
}

/// Result of an allocation run
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub effective_income: f64,
    pub savings: f64,
    pub cap: f64,
    pub fixed_total: f64,
    pub available_for_variable: f64,
    /// Scaling ratio applied to variable bases (None when infeasible)
    pub ratio: Option<f64>,
    /// One line per category observed or targeted, in name order
    pub lines: Vec<BudgetLine>,
    pub outcome: AllocationOutcome,
}

impl Allocation {
    pub fn is_feasible(&self) -> bool {
        self.outcome == AllocationOutcome::Allocated
    }

    pub fn fixed_lines(&self) -> impl Iterator<Item = &BudgetLine> {
        self.lines.iter().filter(|l| l.is_fixed())
    }

    pub fn variable_lines(&self) -> impl Iterator<Item = &BudgetLine> {
        self.lines.iter().filter(|l| !l.is_fixed())
    }
}

/// Allocates a savings-adjusted cap across categories
#[derive(Debug, Clone)]
pub struct Allocator<'a> {
    classifier: &'a Classifier,
    /// Minimum budget for a variable category
    floor: f64,
    /// Multiplier on average expenses used when no income was recorded
    income_fallback_multiplier: f64,
}

impl<'a> Allocator<'a> {
    pub fn new(classifier: &'a Classifier, floor: f64, income_fallback_multiplier: f64) -> Self {
        Self {
            classifier,
            floor,
            income_fallback_multiplier,
        }
    }

    pub fn allocate(&self, input: &AllocationInput<'_>) -> Allocation {
        let divisor = months_divisor(input.months);
        let aggregation = input.aggregation;

        // 1. Effective income
        let avg_income = aggregation.total_income / divisor;
        let effective_income = if avg_income > 0.0 {
            avg_income
        } else {
            let fallback =
                aggregation.total_expenses / divisor * self.income_fallback_multiplier;
            debug!(
                effective_income = fallback,
                multiplier = self.income_fallback_multiplier,
                "No income recorded, estimating from expenses"
            );
            fallback
        };

        // 2. Cap
        let savings = effective_income * input.savings_rate;
        let cap = effective_income - savings;

        let mut lines = self.build_lines(input);

        // 3. Fixed assignment
        let mut fixed_total = 0.0;
        for line in lines.iter_mut().filter(|l| l.is_fixed()) {
            line.recommended = round2(line.target.unwrap_or(line.stats.avg_per_month));
            fixed_total += line.recommended;
        }
        let fixed_total = round2(fixed_total);

        // 4. Feasibility gate
        if fixed_total > cap {
            let shortfall = round2(fixed_total - cap);
            debug!(fixed_total, cap, shortfall, "Fixed expenses exceed the cap");
            return Allocation {
                effective_income,
                savings,
                cap,
                fixed_total,
                available_for_variable: cap - fixed_total,
                ratio: None,
                lines,
                outcome: AllocationOutcome::Infeasible { shortfall },
            };
        }

        // 5. Variable bases
        let available = cap - fixed_total;
        let mut base_sum = 0.0;
        for line in lines.iter_mut().filter(|l| !l.is_fixed()) {
            let base = line.target.unwrap_or(line.stats.avg_per_month);
            let base = if base.is_finite() { base } else { 0.0 };
            line.base = Some(base);
            base_sum += base;
        }

        // 6. Ratio
        let ratio = if base_sum > 0.0 {
            (available / base_sum).clamp(0.0, 1.0)
        } else {
            1.0
        };

        // 7-8. Scale, then floor
        for line in lines.iter_mut().filter(|l| !l.is_fixed()) {
            let scaled = round2(line.base.unwrap_or(0.0) * ratio);
            line.recommended = scaled.max(self.floor);
        }

        debug!(
            cap,
            fixed_total,
            available,
            base_sum,
            ratio,
            "Scaled variable categories"
        );

        // 9. Essential redistribution
        let variable_total: f64 = lines
            .iter()
            .filter(|l| !l.is_fixed())
            .map(|l| l.recommended)
            .sum();
        let reste = available - variable_total;
        if reste > 0.0 {
            self.redistribute(&mut lines, reste);
        }

        // 10. Overflow correction
        self.correct_overflow(&mut lines, cap + fixed_total);

        Allocation {
            effective_income,
            savings,
            cap,
            fixed_total,
            available_for_variable: available,
            ratio: Some(ratio),
            lines,
            outcome: AllocationOutcome::Allocated,
        }
    }

    /// One line per observed or targeted category
    fn build_lines(&self, input: &AllocationInput<'_>) -> Vec<BudgetLine> {
        let mut stats: BTreeMap<&str, CategoryStats> = input
            .aggregation
            .categories
            .iter()
            .map(|(name, s)| (name.as_str(), s.clone()))
            .collect();
        for name in input.targets.keys() {
            stats.entry(name.as_str()).or_default();
        }

        stats
            .into_iter()
            .map(|(name, stats)| BudgetLine {
                category: name.to_string(),
                stats,
                class: self.classifier.classify(name),
                essential: self.classifier.is_essential(name),
                target: input.targets.get(name).copied(),
                base: None,
                recommended: 0.0,
            })
            .collect()
    }

    /// Spread a positive leftover over essential variable categories
    fn redistribute(&self, lines: &mut [BudgetLine], reste: f64) {
        let essentials: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_fixed() && l.essential)
            .map(|(i, _)| i)
            .collect();

        if essentials.is_empty() {
            debug!(reste, "No essential category to receive leftover budget");
            return;
        }

        let essential_base: f64 = essentials
            .iter()
            .map(|&i| lines[i].base.unwrap_or(0.0))
            .sum();
        let count = essentials.len() as f64;

        for &i in &essentials {
            let line = &mut lines[i];
            let share = if essential_base > 0.0 {
                line.base.unwrap_or(0.0) / essential_base
            } else {
                1.0 / count
            };
            line.recommended = round2(line.recommended + reste * share).max(self.floor);
        }

        debug!(
            reste,
            essentials = essentials.len(),
            "Redistributed leftover to essential categories"
        );
    }

    /// Trim variable categories proportionally when the grand total exceeds `limit`
    ///
    /// Lines pinned at the floor drop out and the remainder is spread over
    /// the lines still above it. The total stays above `limit` only when
    /// every variable line sits at the floor.
    fn correct_overflow(&self, lines: &mut [BudgetLine], limit: f64) {
        let grand_total: f64 = lines.iter().map(|l| l.recommended).sum();
        let initial = grand_total - limit;
        if initial <= OVERFLOW_EPSILON {
            return;
        }

        let mut overflow = initial;
        // Each pass either absorbs the overflow or pins a line at the floor
        for _ in 0..=lines.len() {
            let trimmable_total: f64 = lines
                .iter()
                .filter(|l| !l.is_fixed() && l.recommended > self.floor)
                .map(|l| l.recommended)
                .sum();
            if trimmable_total <= 0.0 {
                break;
            }

            let pass = overflow;
            for line in lines
                .iter_mut()
                .filter(|l| !l.is_fixed() && l.recommended > self.floor)
            {
                let cut = pass * line.recommended / trimmable_total;
                let trimmed = (line.recommended - cut).max(self.floor);
                overflow -= line.recommended - trimmed;
                line.recommended = trimmed;
            }

            if overflow <= OVERFLOW_EPSILON {
                break;
            }
        }

        for line in lines.iter_mut().filter(|l| !l.is_fixed()) {
            line.recommended = round2(line.recommended).max(self.floor);
        }

        debug!(
            overflow = initial,
            remaining = overflow.max(0.0),
            grand_total,
            limit,
            "Corrected budget overflow"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecommendConfig;

    fn classifier() -> Classifier {
        Classifier::from_config(&RecommendConfig::embedded().unwrap())
    }

    /// Aggregation with per-category monthly averages over `months`
    fn aggregation(months: usize, income_per_month: f64, categories: &[(&str, f64)]) -> Aggregation {
        let m = months as f64;
        let mut agg = Aggregation {
            total_income: income_per_month * m,
            ..Default::default()
        };
        for (name, avg) in categories {
            agg.total_expenses += avg * m;
            agg.categories.insert(
                name.to_string(),
                CategoryStats {
                    total: avg * m,
                    avg_per_month: *avg,
                    median: *avg,
                    count: months,
                },
            );
        }
        agg
    }

    fn run(agg: &Aggregation, months: usize, targets: &BTreeMap<String, f64>) -> Allocation {
        let classifier = classifier();
        let allocator = Allocator::new(&classifier, 10.0, 1.2);
        allocator.allocate(&AllocationInput {
            aggregation: agg,
            months,
            savings_rate: 0.10,
            targets,
        })
    }

    fn line<'a>(allocation: &'a Allocation, name: &str) -> &'a BudgetLine {
        allocation
            .lines
            .iter()
            .find(|l| l.category == name)
            .unwrap()
    }

    #[test]
    fn test_scenario_single_essential_receives_leftover() {
        let agg = aggregation(3, 3000.0, &[("Loyer", 1000.0), ("Alimentation", 400.0)]);
        let allocation = run(&agg, 3, &BTreeMap::new());

        assert!(allocation.is_feasible());
        assert_eq!(allocation.effective_income, 3000.0);
        assert_eq!(allocation.cap, 2700.0);
        assert_eq!(allocation.fixed_total, 1000.0);
        assert_eq!(allocation.available_for_variable, 1700.0);
        assert_eq!(allocation.ratio, Some(1.0));
        assert_eq!(line(&allocation, "Loyer").recommended, 1000.0);
        assert_eq!(line(&allocation, "Alimentation").recommended, 1700.0);
    }

    #[test]
    fn test_scenario_fixed_exceeds_cap() {
        let agg = aggregation(
            3,
            3000.0,
            &[("Loyer", 2000.0), ("Assurance", 900.0), ("Loisirs", 200.0)],
        );
        let allocation = run(&agg, 3, &BTreeMap::new());

        assert_eq!(
            allocation.outcome,
            AllocationOutcome::Infeasible { shortfall: 200.0 }
        );
        assert_eq!(allocation.fixed_total, 2900.0);
        assert_eq!(allocation.ratio, None);
        // Variable categories were never allocated
        assert_eq!(line(&allocation, "Loisirs").recommended, 0.0);
        assert_eq!(line(&allocation, "Loisirs").base, None);
    }

    #[test]
    fn test_scenario_zero_base_gets_floor() {
        let agg = aggregation(
            3,
            3000.0,
            &[("Loyer", 1000.0), ("Loisirs", 300.0), ("Cadeaux", 0.0)],
        );
        let allocation = run(&agg, 3, &BTreeMap::new());

        let gifts = line(&allocation, "Cadeaux");
        assert_eq!(gifts.base, Some(0.0));
        assert_eq!(gifts.recommended, 10.0);
        // Leisure is not essential, so it keeps its scaled base
        assert_eq!(line(&allocation, "Loisirs").recommended, 300.0);
    }

    #[test]
    fn test_scenario_essentials_split_by_base_weight() {
        // cap = 1800, fixed 1200, available 600; bases 300 + 100 leave 200
        let agg = aggregation(
            1,
            2000.0,
            &[("Loyer", 1200.0), ("Alimentation", 300.0), ("Transport", 100.0)],
        );
        let allocation = run(&agg, 1, &BTreeMap::new());

        assert_eq!(allocation.available_for_variable, 600.0);
        assert_eq!(line(&allocation, "Alimentation").recommended, 450.0);
        assert_eq!(line(&allocation, "Transport").recommended, 150.0);
    }

    #[test]
    fn test_equal_split_when_essential_bases_are_zero() {
        let agg = aggregation(
            1,
            1000.0,
            &[("Alimentation", 0.0), ("Transport", 0.0)],
        );
        let allocation = run(&agg, 1, &BTreeMap::new());

        // cap 900, both floored at 10, leftover 880 split evenly
        assert_eq!(line(&allocation, "Alimentation").recommended, 450.0);
        assert_eq!(line(&allocation, "Transport").recommended, 450.0);
    }

    #[test]
    fn test_ratio_scales_variable_categories_down() {
        // cap 900, fixed 500, available 400 for bases 600 + 200
        let agg = aggregation(
            1,
            1000.0,
            &[("Loyer", 500.0), ("Loisirs", 600.0), ("Restaurants", 200.0)],
        );
        let allocation = run(&agg, 1, &BTreeMap::new());

        assert_eq!(allocation.ratio, Some(0.5));
        assert_eq!(line(&allocation, "Loisirs").recommended, 300.0);
        assert_eq!(line(&allocation, "Restaurants").recommended, 100.0);
        assert_eq!(line(&allocation, "Loyer").recommended, 500.0);
    }

    #[test]
    fn test_fixed_category_ignores_ratio() {
        let mut targets = BTreeMap::new();
        targets.insert("Loyer".to_string(), 850.0);

        let agg = aggregation(1, 1000.0, &[("Loyer", 900.0), ("Loisirs", 5000.0)]);
        let allocation = run(&agg, 1, &targets);

        let rent = line(&allocation, "Loyer");
        assert_eq!(rent.recommended, 850.0);
        assert_eq!(rent.base, None);
        assert!(allocation.ratio.unwrap() < 1.0);
    }

    #[test]
    fn test_target_overrides_average_for_variable_base() {
        let mut targets = BTreeMap::new();
        targets.insert("Loisirs".to_string(), 50.0);

        let agg = aggregation(1, 3000.0, &[("Loisirs", 400.0)]);
        let allocation = run(&agg, 1, &targets);

        let leisure = line(&allocation, "Loisirs");
        assert_eq!(leisure.base, Some(50.0));
        assert_eq!(leisure.recommended, 50.0);
    }

    #[test]
    fn test_targeted_category_without_history_is_listed() {
        let mut targets = BTreeMap::new();
        targets.insert("Vacances".to_string(), 120.0);

        let agg = aggregation(1, 3000.0, &[("Loisirs", 100.0)]);
        let allocation = run(&agg, 1, &targets);

        let holidays = line(&allocation, "Vacances");
        assert_eq!(holidays.stats.total, 0.0);
        assert_eq!(holidays.recommended, 120.0);
    }

    #[test]
    fn test_no_income_uses_expense_fallback() {
        let agg = aggregation(2, 0.0, &[("Loyer", 500.0), ("Alimentation", 500.0)]);
        let allocation = run(&agg, 2, &BTreeMap::new());

        // expenses 1000/month * 1.2
        assert!((allocation.effective_income - 1200.0).abs() < 1e-9);
        assert!((allocation.cap - 1080.0).abs() < 1e-9);
        assert_eq!(line(&allocation, "Alimentation").recommended, 580.0);
    }

    #[test]
    fn test_empty_history_is_feasible_and_empty() {
        let allocation = run(&Aggregation::default(), 0, &BTreeMap::new());
        assert!(allocation.is_feasible());
        assert_eq!(allocation.cap, 0.0);
        assert!(allocation.lines.is_empty());
    }

    #[test]
    fn test_floor_wins_when_nothing_is_available() {
        // cap 900, fixed exactly 900
        let agg = aggregation(1, 1000.0, &[("Loyer", 900.0), ("Loisirs", 80.0)]);
        let allocation = run(&agg, 1, &BTreeMap::new());

        assert!(allocation.is_feasible());
        assert_eq!(allocation.ratio, Some(0.0));
        assert_eq!(line(&allocation, "Loisirs").recommended, 10.0);
    }

    #[test]
    fn test_overflow_correction_trims_variable_only() {
        let classifier = classifier();
        let allocator = Allocator::new(&classifier, 10.0, 1.2);
        let mut lines = vec![
            BudgetLine {
                category: "Loyer".into(),
                stats: CategoryStats::default(),
                class: CategoryClass::Fixed,
                essential: false,
                target: None,
                base: None,
                recommended: 100.0,
            },
            BudgetLine {
                category: "Loisirs".into(),
                stats: CategoryStats::default(),
                class: CategoryClass::Variable,
                essential: false,
                target: None,
                base: Some(75.0),
                recommended: 75.0,
            },
            BudgetLine {
                category: "Restaurants".into(),
                stats: CategoryStats::default(),
                class: CategoryClass::Variable,
                essential: false,
                target: None,
                base: Some(25.0),
                recommended: 25.0,
            },
        ];

        allocator.correct_overflow(&mut lines, 180.0);

        assert_eq!(lines[0].recommended, 100.0);
        assert_eq!(lines[1].recommended, 60.0);
        assert_eq!(lines[2].recommended, 20.0);
    }

    #[test]
    fn test_invariants_hold_across_varied_inputs() {
        let classifier = classifier();
        let allocator = Allocator::new(&classifier, 10.0, 1.2);
        let names = ["Loyer", "Alimentation", "Transport", "Loisirs", "Cadeaux", "Assurance"];

        // Deterministic pseudo-random spread of incomes and category averages
        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) % 2000) as f64
        };

        for _ in 0..200 {
            let income = next() * 2.0;
            let categories: Vec<(&str, f64)> = names.iter().map(|n| (*n, round2(next() / 3.0))).collect();
            let agg = aggregation(3, income, &categories);
            let targets = BTreeMap::new();
            let input = AllocationInput {
                aggregation: &agg,
                months: 3,
                savings_rate: 0.15,
                targets: &targets,
            };

            let allocation = allocator.allocate(&input);
            assert_eq!(allocation, allocator.allocate(&input));

            for line in allocation.fixed_lines() {
                assert_eq!(line.recommended, round2(line.stats.avg_per_month));
            }
            if !allocation.is_feasible() {
                continue;
            }

            let ratio = allocation.ratio.unwrap();
            assert!((0.0..=1.0).contains(&ratio));
            for line in allocation.variable_lines() {
                assert!(line.recommended >= 10.0, "{:?}", line);
            }

            let total: f64 = allocation.lines.iter().map(|l| l.recommended).sum();
            let limit = allocation.cap + allocation.fixed_total;
            let all_at_floor = allocation.variable_lines().all(|l| l.recommended <= 10.0);
            assert!(
                total <= limit + 0.01 * allocation.lines.len() as f64 || all_at_floor,
                "total {} over limit {}",
                total,
                limit
            );
        }
    }

    #[test]
    fn test_overflow_carried_past_floored_lines() {
        let mut categories = vec![("Loisirs", 500.0)];
        let small: Vec<String> = (0..11).map(|i| format!("Divers {}", i)).collect();
        categories.extend(small.iter().map(|n| (n.as_str(), 1.0)));
        let agg = aggregation(1, 111.11, &categories);

        let allocation = run(&agg, 1, &BTreeMap::new());
        assert!(allocation.is_feasible());
        assert_eq!(allocation.fixed_total, 0.0);

        // Twelve lines at the floor is the least the allocator can give
        let total: f64 = allocation.lines.iter().map(|l| l.recommended).sum();
        assert_eq!(line(&allocation, "Loisirs").recommended, 10.0);
        assert!((total - 120.0).abs() < 1e-9, "{}", total);
    }

    #[test]
    fn test_overflow_correction_reaches_limit_when_room_remains() {
        let classifier = classifier();
        let allocator = Allocator::new(&classifier, 10.0, 1.2);
        let variable = |name: &str, amount: f64| BudgetLine {
            category: name.into(),
            stats: CategoryStats::default(),
            class: CategoryClass::Variable,
            essential: false,
            target: None,
            base: Some(amount),
            recommended: amount,
        };
        let mut lines = vec![
            variable("Loisirs", 200.0),
            variable("Cadeaux", 12.0),
            variable("Restaurants", 12.0),
        ];

        allocator.correct_overflow(&mut lines, 100.0);

        let total: f64 = lines.iter().map(|l| l.recommended).sum();
        assert!((total - 100.0).abs() < 0.02, "{}", total);
        assert_eq!(lines[1].recommended, 10.0);
        assert_eq!(lines[2].recommended, 10.0);
    }

    #[test]
    fn test_overflow_correction_respects_floor() {
        let classifier = classifier();
        let allocator = Allocator::new(&classifier, 10.0, 1.2);
        let mut lines = vec![BudgetLine {
            category: "Loisirs".into(),
            stats: CategoryStats::default(),
            class: CategoryClass::Variable,
            essential: false,
            target: None,
            base: Some(12.0),
            recommended: 12.0,
        }];

        allocator.correct_overflow(&mut lines, 0.0);
        assert_eq!(lines[0].recommended, 10.0);
    }
}
