//! Session audit endpoints.
//!
//! Authentication itself is per-request Basic auth; these endpoints exist so
//! the UI's explicit sign-in/sign-out moments land in the audit trail. Audit
//! writes are best-effort and never fail the request.

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::{ServerError, server::ServerState, user};

#[derive(Serialize)]
pub struct SessionView {
    pub username: String,
    pub is_admin: bool,
}

pub async fn sign_in(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<SessionView>, ServerError> {
    state.engine.audit().log_sign_in(&user.username).await;
    Ok(Json(SessionView {
        username: user.username,
        is_admin: user.is_admin,
    }))
}

pub async fn sign_out(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<()>, ServerError> {
    state.engine.audit().log_sign_out(&user.username).await;
    Ok(Json(()))
}
