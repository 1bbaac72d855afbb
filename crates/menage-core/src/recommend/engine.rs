//! Recommendation engine: request in, budgets out

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, error, warn};

use super::aggregate::aggregate;
use super::allocate::{AllocationInput, Allocator};
use super::classify::Classifier;
use super::period::{resolve_periods, ResolvedPeriods};
use super::present::present;
use super::types::{BudgetRecommendation, RecommendParams, RecommendRequest};
use crate::config::RecommendConfig;
use crate::error::{Error, Result};
use crate::models::{DateRange, PeriodClosure, TransactionRecord};

/// Where the engine reads a user's history from
pub trait TransactionSource {
    /// Whether the user has at least one linked account
    fn has_accounts(&self, user: &str) -> Result<bool>;

    /// Recorded closed-period boundaries
    fn closed_periods(&self, user: &str) -> Result<Vec<PeriodClosure>>;

    /// Date of the user's earliest transaction, if any
    fn first_transaction_date(&self, user: &str) -> Result<Option<NaiveDate>>;

    /// Transactions falling in any of the ranges, each returned once
    fn transactions_in(&self, user: &str, ranges: &[DateRange]) -> Result<Vec<TransactionRecord>>;

    /// Stored per-category monthly targets
    fn category_targets(&self, user: &str) -> Result<BTreeMap<String, f64>>;
}

/// Computes monthly budget recommendations
#[derive(Debug, Clone)]
pub struct BudgetEngine {
    config: RecommendConfig,
    classifier: Classifier,
}

impl BudgetEngine {
    pub fn new(config: RecommendConfig) -> Self {
        let classifier = Classifier::from_config(&config);
        Self { config, classifier }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Validate a request, load the user's history and compute budgets
    ///
    /// Returns `Error::NoAccount` when the user has no linked account and
    /// `Error::InvalidInput` for out-of-range parameters. Fixed expenses
    /// exceeding the cap are not an error: the recommendation carries an
    /// `error` message instead.
    pub fn recommend<S: TransactionSource + ?Sized>(
        &self,
        source: &S,
        user: &str,
        request: &RecommendRequest,
        today: NaiveDate,
    ) -> Result<BudgetRecommendation> {
        let mut params = step("validate", request.validate(&self.config, today))?;
        debug!(
            user,
            months_window = params.months_window,
            selected_month = %params.selected_month,
            savings_rate = params.savings_rate,
            targets = params.targets.len(),
            "Validated recommendation request"
        );

        if !step("accounts", source.has_accounts(user))? {
            warn!(user, "Recommendation requested without any account");
            return Err(Error::NoAccount);
        }

        let closures = step("closures", source.closed_periods(user))?;
        let history_start = step("history", source.first_transaction_date(user))?;
        let periods = resolve_periods(
            params.months_window,
            params.selected_month,
            &closures,
            history_start,
        );
        debug!(
            requested = params.months_window,
            actual = periods.actual_months(),
            closures = closures.len(),
            "Resolved analysis periods"
        );

        let records = step("transactions", source.transactions_in(user, &periods.ranges))?;
        debug!(transactions = records.len(), "Fetched transactions");

        // Request targets override stored ones
        let mut targets = step("targets", source.category_targets(user))?;
        targets.append(&mut params.targets);
        params.targets = targets;

        Ok(self.compute(&records, &periods, &params))
    }

    /// Run the pure pipeline on already-fetched transactions
    pub fn compute(
        &self,
        records: &[TransactionRecord],
        periods: &ResolvedPeriods,
        params: &RecommendParams,
    ) -> BudgetRecommendation {
        let months = periods.actual_months();
        let aggregation = aggregate(records, months, &self.config.uncategorized_label);
        debug!(
            categories = aggregation.categories.len(),
            total_income = aggregation.total_income,
            total_expenses = aggregation.total_expenses,
            "Aggregated transactions"
        );

        let allocator = Allocator::new(
            &self.classifier,
            self.config.min_variable_budget,
            self.config.income_fallback_multiplier,
        );
        let allocation = allocator.allocate(&AllocationInput {
            aggregation: &aggregation,
            months,
            savings_rate: params.savings_rate,
            targets: &params.targets,
        });

        let recommendation = present(&allocation, periods, params.months_window);
        debug!(
            budgets = recommendation.budgets.len(),
            feasible = recommendation.is_feasible(),
            cap = recommendation.meta.cap_disponible,
            fixed_total = recommendation.meta.fixed_total,
            "Computed budget recommendation"
        );
        recommendation
    }
}

/// Log a failing step before propagating
fn step<T>(name: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|e| {
        match &e {
            Error::InvalidInput(_) | Error::NoAccount => {
                debug!(step = name, error = %e, "Rejected recommendation request")
            }
            _ => error!(step = name, error = %e, "Budget recommendation failed"),
        }
        e
    })
}
