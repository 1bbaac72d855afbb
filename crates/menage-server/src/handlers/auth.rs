//! Authentication-related handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};
use serde::Serialize;

use crate::{get_user_email, AppState};

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The authenticated user's email or identifier
    pub user: String,
    /// How the user was authenticated
    pub auth_method: String,
}

/// GET /api/me - The currently authenticated user
pub async fn get_me(State(state): State<Arc<AppState>>, request: Request) -> Json<MeResponse> {
    let user = get_user_email(request.headers());

    let auth_method = if !state.config.require_auth && user == "local-dev" {
        "none"
    } else if user == "api-key" {
        "api_key"
    } else if user.contains('@') {
        "cloudflare_header"
    } else {
        "unknown"
    };

    if let Err(e) = state.db.log_audit(&user, "view", Some("me"), None) {
        tracing::warn!(error = %e, "Failed to write audit entry");
    }

    Json(MeResponse {
        user,
        auth_method: auth_method.to_string(),
    })
}
