//! Closed-period handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};

use super::read_json;
use crate::{get_user_email, AppError, AppState, SuccessResponse};
use menage_core::models::{PeriodClosure, YearMonth};

/// GET /api/periods - The caller's closed periods, most recent first
pub async fn list_periods(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<PeriodClosure>>, AppError> {
    let user_email = get_user_email(request.headers());

    let closures = state.db.list_period_closures(&user_email)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("period"),
        Some(&format!("count={}", closures.len())),
    )?;

    Ok(Json(closures))
}

/// POST /api/periods - Record a closure `{ month, start, end }`
pub async fn close_period(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<PeriodClosure>, AppError> {
    let user_email = get_user_email(request.headers());
    let closure: PeriodClosure = read_json(request).await?;

    state
        .db
        .close_period(&user_email, &closure)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user_email,
        "create",
        Some("period"),
        Some(&format!(
            "month={}, start={}, end={}",
            closure.month, closure.start, closure.end
        )),
    )?;

    Ok(Json(closure))
}

/// DELETE /api/periods/:month - Reopen a month
pub async fn reopen_period(
    State(state): State<Arc<AppState>>,
    Path(month): Path<String>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());
    let month: YearMonth = month.parse().map_err(|e: String| AppError::bad_request(&e))?;

    let reopened = state.db.reopen_period(&user_email, month)?;

    state.db.log_audit(
        &user_email,
        "delete",
        Some("period"),
        Some(&format!("month={}, reopened={}", month, reopened)),
    )?;

    if !reopened {
        return Err(AppError::not_found(&format!("Period {} is not closed", month)));
    }

    Ok(Json(SuccessResponse { success: true }))
}
