//! Request and response types for budget recommendations

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::RecommendConfig;
use crate::error::{Error, Result};
use crate::models::YearMonth;

/// Recommendation request as received from a caller
///
/// Every field is optional; `validate` applies defaults from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendRequest {
    /// Number of completed months to analyze
    pub months_window: Option<i64>,
    /// Reference month ("YYYY-MM"); months before it are analyzed
    pub selected_month: Option<String>,
    /// Fraction of income to set aside, in [0, 1]
    pub savings_rate: Option<f64>,
    /// Monthly targets per category; non-numeric values are ignored
    pub targets: BTreeMap<String, serde_json::Value>,
}

/// A validated request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendParams {
    pub months_window: u32,
    pub selected_month: YearMonth,
    pub savings_rate: f64,
    /// Sanitized targets: finite, non-negative amounts only
    pub targets: BTreeMap<String, f64>,
}

impl RecommendRequest {
    /// Apply defaults and reject out-of-range values
    pub fn validate(&self, config: &RecommendConfig, today: NaiveDate) -> Result<RecommendParams> {
        let months_window = match self.months_window {
            None => config.default_months_window,
            Some(n) if (1..=i64::from(config.max_months_window)).contains(&n) => n as u32,
            Some(n) => {
                return Err(Error::InvalidInput(format!(
                    "monthsWindow must be between 1 and {} (got {})",
                    config.max_months_window, n
                )))
            }
        };

        let selected_month = match self.selected_month.as_deref().map(str::trim) {
            None | Some("") => YearMonth::from_date(today),
            Some(s) => s.parse::<YearMonth>().map_err(Error::InvalidInput)?,
        };

        let savings_rate = match self.savings_rate {
            None => config.default_savings_rate,
            Some(rate) if rate.is_finite() && (0.0..=1.0).contains(&rate) => rate,
            Some(rate) => {
                return Err(Error::InvalidInput(format!(
                    "savingsRate must be between 0 and 1 (got {})",
                    rate
                )))
            }
        };

        let mut targets = BTreeMap::new();
        for (key, value) in &self.targets {
            let category = key.trim();
            let amount = match sanitize_target(value) {
                Some(amount) if !category.is_empty() => amount,
                _ => {
                    tracing::debug!(category, %value, "Ignoring unusable budget target");
                    continue;
                }
            };
            if let Some(previous) = targets.insert(category.to_string(), amount) {
                tracing::warn!(
                    category,
                    key = key.as_str(),
                    previous,
                    amount,
                    "Budget target names collide after trimming, keeping the last"
                );
            }
        }

        Ok(RecommendParams {
            months_window,
            selected_month,
            savings_rate,
            targets,
        })
    }
}

/// Keep a target only if it is a finite, non-negative number
pub fn sanitize_target(value: &serde_json::Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Recommendation for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudget {
    pub category: String,
    /// Historical spend over the analyzed window
    pub total: f64,
    pub avg_per_month: f64,
    /// Median individual expense
    pub median: f64,
    /// Typical month estimated from the median transaction (display only)
    pub realistic: f64,
    pub is_fixed: bool,
    pub is_essential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_target: Option<f64>,
    /// Allocation weight; only set for variable categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    pub recommended_monthly: f64,
}

/// Summary of how the cap was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMeta {
    pub months_window: u32,
    pub actual_months_analyzed: usize,
    pub months_analyzed: Vec<String>,
    pub effective_income: f64,
    pub cap_disponible: f64,
    pub fixed_total: f64,
}

/// Engine output
///
/// When fixed expenses exceed the cap, `error` explains the shortfall and
/// `budgets` holds only the fixed categories. This is still a successful
/// result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecommendation {
    pub budgets: Vec<CategoryBudget>,
    pub meta: RecommendationMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BudgetRecommendation {
    pub fn is_feasible(&self) -> bool {
        self.error.is_none()
    }

    /// Sum of all recommended amounts
    pub fn total_recommended(&self) -> f64 {
        self.budgets.iter().map(|b| b.recommended_monthly).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn config() -> RecommendConfig {
        RecommendConfig::embedded().unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let params = RecommendRequest::default()
            .validate(&config(), today())
            .unwrap();
        assert_eq!(params.months_window, 3);
        assert_eq!(params.selected_month.to_string(), "2024-05");
        assert!((params.savings_rate - 0.10).abs() < f64::EPSILON);
        assert!(params.targets.is_empty());
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: RecommendRequest = serde_json::from_value(json!({
            "monthsWindow": 6,
            "selectedMonth": "2024-01",
            "savingsRate": 0.2,
            "targets": { "Loisirs": 150 }
        }))
        .unwrap();

        let params = request.validate(&config(), today()).unwrap();
        assert_eq!(params.months_window, 6);
        assert_eq!(params.selected_month.to_string(), "2024-01");
        assert_eq!(params.targets["Loisirs"], 150.0);
    }

    #[test]
    fn test_invalid_window_rejected() {
        for window in [0, -2, 25] {
            let request = RecommendRequest {
                months_window: Some(window),
                ..Default::default()
            };
            let err = request.validate(&config(), today()).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{}", window);
        }
    }

    #[test]
    fn test_invalid_savings_rate_rejected() {
        for rate in [-0.1, 1.01, f64::NAN] {
            let request = RecommendRequest {
                savings_rate: Some(rate),
                ..Default::default()
            };
            assert!(request.validate(&config(), today()).is_err());
        }
    }

    #[test]
    fn test_invalid_month_rejected() {
        let request = RecommendRequest {
            selected_month: Some("May 2024".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.validate(&config(), today()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unusable_targets_ignored() {
        let request: RecommendRequest = serde_json::from_value(json!({
            "targets": {
                "Loyer": 950.5,
                "Loisirs": "beaucoup",
                "Cadeaux": null,
                "Voyages": -20,
                "  ": 10
            }
        }))
        .unwrap();

        let params = request.validate(&config(), today()).unwrap();
        assert_eq!(params.targets.len(), 1);
        assert_eq!(params.targets["Loyer"], 950.5);
    }

    #[test]
    fn test_targets_colliding_after_trim_keep_last() {
        let request: RecommendRequest = serde_json::from_value(json!({
            "targets": { "Loyer": 900, "Loyer ": 950 }
        }))
        .unwrap();

        let params = request.validate(&config(), today()).unwrap();
        assert_eq!(params.targets.len(), 1);
        // BTreeMap order: "Loyer" sorts before "Loyer "
        assert_eq!(params.targets["Loyer"], 950.0);
    }

    #[test]
    fn test_infeasible_serializes_error_field() {
        let recommendation = BudgetRecommendation {
            budgets: vec![],
            meta: RecommendationMeta {
                months_window: 3,
                actual_months_analyzed: 3,
                months_analyzed: vec!["2024-04".into()],
                effective_income: 3000.0,
                cap_disponible: 2700.0,
                fixed_total: 2900.0,
            },
            error: Some("Fixed expenses exceed the available budget".into()),
        };

        let value = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(value["meta"]["capDisponible"], 2700.0);
        assert_eq!(value["meta"]["actualMonthsAnalyzed"], 3);
        assert!(value["error"].is_string());
        assert!(!recommendation.is_feasible());
    }
}
