//! Attachment API endpoints.
//!
//! This is the blob-storage boundary: file bytes are written to and removed
//! from the configured attachments directory here, while the engine keeps
//! only the metadata. Downloads go through the authenticated endpoint.

use api_types::attachment::{AttachmentKind as ApiKind, AttachmentNew, AttachmentView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use base64::Engine as _;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::AttachmentKind;

fn map_kind(kind: ApiKind) -> AttachmentKind {
    match kind {
        ApiKind::Refill => AttachmentKind::Refill,
        ApiKind::Transaction => AttachmentKind::Transaction,
    }
}

fn map_engine_kind(kind: AttachmentKind) -> ApiKind {
    match kind {
        AttachmentKind::Refill => ApiKind::Refill,
        AttachmentKind::Transaction => ApiKind::Transaction,
    }
}

fn view(att: engine::Attachment) -> AttachmentView {
    AttachmentView {
        id: att.id,
        entity_kind: map_engine_kind(att.entity_kind),
        entity_id: att.entity_id,
        filename: att.filename,
        uploaded_at: att.uploaded_at,
    }
}

/// Keeps only characters safe for a flat storage directory.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub async fn upload(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AttachmentNew>,
) -> Result<Json<AttachmentView>, ServerError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.content_base64.as_bytes())
        .map_err(|_| ServerError::Generic("content_base64 is not valid base64".to_string()))?;

    let storage_key = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&payload.filename));
    let path = state.attachments_dir.join(&storage_key);

    tokio::fs::create_dir_all(&state.attachments_dir)
        .await
        .map_err(|err| ServerError::Generic(format!("attachment storage unavailable: {err}")))?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|err| ServerError::Generic(format!("failed to store attachment: {err}")))?;

    let result = state
        .engine
        .add_attachment(
            &user::actor(&user),
            map_kind(payload.entity_kind),
            payload.entity_id,
            &payload.filename,
            &storage_key,
        )
        .await;

    match result {
        Ok(attachment) => Ok(Json(view(attachment))),
        Err(err) => {
            // The metadata row was rejected; don't leave the bytes behind.
            if let Err(rm_err) = tokio::fs::remove_file(&path).await {
                tracing::warn!("failed to clean up rejected attachment {storage_key}: {rm_err}");
            }
            Err(err.into())
        }
    }
}

#[derive(Deserialize)]
pub struct ListParams {
    entity_kind: ApiKind,
    entity_id: Uuid,
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AttachmentView>>, ServerError> {
    let attachments = state
        .engine
        .attachments_for(map_kind(params.entity_kind), params.entity_id)
        .await?;
    Ok(Json(attachments.into_iter().map(view).collect()))
}

pub async fn get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AttachmentView>, ServerError> {
    let attachment = state.engine.attachment(id).await?;
    Ok(Json(view(attachment)))
}

pub async fn download(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let attachment = state.engine.attachment(id).await?;
    let path = state.attachments_dir.join(&attachment.storage_key);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ServerError::Generic("attachment file is missing".to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", attachment.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    let attachment = state
        .engine
        .delete_attachment(&user::actor(&user), id)
        .await?;

    let path = state.attachments_dir.join(&attachment.storage_key);
    if let Err(err) = tokio::fs::remove_file(&path).await {
        tracing::warn!(
            "attachment {} deleted but file {} could not be removed: {err}",
            attachment.id,
            attachment.storage_key
        );
    }
    Ok(Json(()))
}
