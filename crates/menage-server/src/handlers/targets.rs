//! Stored category target handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::read_json;
use crate::{get_user_email, AppError, AppState, SuccessResponse};

/// Request body for setting a target
#[derive(Debug, Deserialize)]
pub struct SetTargetRequest {
    pub amount: f64,
}

/// A stored target
#[derive(Debug, Serialize)]
pub struct TargetResponse {
    pub category: String,
    pub amount: f64,
}

/// GET /api/budget/targets - Stored monthly targets keyed by category
pub async fn list_targets(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<BTreeMap<String, f64>>, AppError> {
    let user_email = get_user_email(request.headers());

    let targets = state.db.list_category_targets(&user_email)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("category_target"),
        Some(&format!("count={}", targets.len())),
    )?;

    Ok(Json(targets))
}

/// PUT /api/budget/targets/:category - Set a monthly target
pub async fn set_target(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    request: Request,
) -> Result<Json<TargetResponse>, AppError> {
    let user_email = get_user_email(request.headers());
    let body: SetTargetRequest = read_json(request).await?;

    state
        .db
        .set_category_target(&user_email, &category, body.amount)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user_email,
        "update",
        Some("category_target"),
        Some(&format!("category={}, amount={}", category, body.amount)),
    )?;

    Ok(Json(TargetResponse {
        category: category.trim().to_string(),
        amount: body.amount,
    }))
}

/// DELETE /api/budget/targets/:category - Clear a monthly target
pub async fn clear_target(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let removed = state.db.clear_category_target(&user_email, &category)?;

    state.db.log_audit(
        &user_email,
        "delete",
        Some("category_target"),
        Some(&format!("category={}, removed={}", category, removed)),
    )?;

    if !removed {
        return Err(AppError::not_found(&format!(
            "No target set for category {}",
            category
        )));
    }

    Ok(Json(SuccessResponse { success: true }))
}
