//! Budget recommendation handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::Deserialize;

use super::read_json_or_default;
use crate::{get_user_email, AppError, AppState};
use menage_core::{BudgetRecommendation, RecommendRequest};

/// Query parameters for GET /api/budget/recommendations
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub months_window: Option<i64>,
    pub selected_month: Option<String>,
    pub savings_rate: Option<f64>,
}

impl From<RecommendationQuery> for RecommendRequest {
    fn from(query: RecommendationQuery) -> Self {
        Self {
            months_window: query.months_window,
            selected_month: query.selected_month,
            savings_rate: query.savings_rate,
            ..Default::default()
        }
    }
}

/// POST /api/budget/recommendations - Run the engine with a JSON request
pub async fn post_recommendations(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<BudgetRecommendation>, AppError> {
    let user_email = get_user_email(request.headers());
    let body: RecommendRequest = read_json_or_default(request).await?;

    recommend(&state, &user_email, &body)
}

/// GET /api/budget/recommendations - Run the engine with query parameters
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecommendationQuery>,
    request: Request,
) -> Result<Json<BudgetRecommendation>, AppError> {
    let user_email = get_user_email(request.headers());

    recommend(&state, &user_email, &query.into())
}

fn recommend(
    state: &AppState,
    user_email: &str,
    body: &RecommendRequest,
) -> Result<Json<BudgetRecommendation>, AppError> {
    let today = chrono::Local::now().date_naive();
    let result = state.engine.recommend(&state.db, user_email, body, today);

    let details = match &result {
        Ok(rec) => format!(
            "months={}, budgets={}, feasible={}",
            rec.meta.actual_months_analyzed,
            rec.budgets.len(),
            rec.is_feasible()
        ),
        Err(e) => format!("error={}", e),
    };
    state
        .db
        .log_audit(user_email, "recommend", Some("budget"), Some(&details))?;

    result.map(Json).map_err(AppError::from_core)
}
