//! Account handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};

use crate::{get_user_email, AppError, AppState};
use menage_core::models::Account;

/// GET /api/accounts - The caller's accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<Account>>, AppError> {
    let user_email = get_user_email(request.headers());

    let accounts = state.db.list_accounts(&user_email)?;

    state.db.log_audit(
        &user_email,
        "list",
        Some("account"),
        Some(&format!("count={}", accounts.len())),
    )?;

    Ok(Json(accounts))
}
