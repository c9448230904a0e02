//! Balance checkpoint API endpoints.

use api_types::balance::{BalanceView, CheckpointSet};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user};
use engine::MoneyCents;

pub async fn estimate(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<BalanceView>, ServerError> {
    let estimate = state.engine.estimate_balance().await?;
    Ok(Json(BalanceView {
        checkpoint_balance_minor: estimate.checkpoint_balance.map(MoneyCents::cents),
        checkpoint_date: estimate.checkpoint_date,
        estimated_balance_minor: estimate.estimated_balance.map(MoneyCents::cents),
        transactions_since: estimate.transactions_since,
    }))
}

pub async fn set_checkpoint(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CheckpointSet>,
) -> Result<Json<()>, ServerError> {
    state
        .engine
        .set_balance_checkpoint(
            &user::actor(&user),
            MoneyCents::new(payload.balance_minor),
            payload.date,
        )
        .await?;
    Ok(Json(()))
}
