//! Statement import API endpoints.

use api_types::import::{BatchView, ImportNew, ImportResult};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use base64::Engine as _;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::ImportStatementCmd;

fn batch_view(batch: engine::Batch) -> BatchView {
    let consistent = batch.is_consistent();
    BatchView {
        id: batch.id,
        original_filename: batch.original_filename,
        processed_at: batch.processed_at,
        total_count: batch.total_count,
        new_count: batch.new_count,
        duplicate_count: batch.duplicate_count,
        consistent,
    }
}

pub async fn import(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ImportNew>,
) -> Result<Json<ImportResult>, ServerError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.content_base64.as_bytes())
        .map_err(|_| ServerError::Generic("content_base64 is not valid base64".to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ServerError::Generic("statement is not valid UTF-8".to_string()))?;

    let mut cmd = ImportStatementCmd::new(payload.filename, text);
    if let Some(enabled) = payload.use_pattern_matching {
        cmd = cmd.use_pattern_matching(enabled);
    }

    let outcome = state
        .engine
        .import_statement(&user::actor(&user), cmd)
        .await?;
    Ok(Json(ImportResult {
        batch_id: outcome.batch_id,
        account: outcome.account,
        total: outcome.total,
        new_count: outcome.new_count,
        duplicate_count: outcome.duplicate_count,
    }))
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BatchView>>, ServerError> {
    let batches = state.engine.list_batches().await?;
    Ok(Json(batches.into_iter().map(batch_view).collect()))
}

pub async fn get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchView>, ServerError> {
    let batch = state.engine.batch(id).await?;
    Ok(Json(batch_view(batch)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state.engine.delete_batch(&user::actor(&user), id).await?;
    Ok(Json(()))
}
