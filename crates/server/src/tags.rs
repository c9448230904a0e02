//! Tag API endpoints.

use api_types::tag::{TagNew, TagRename, TagReparent, TagView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn view(tag: engine::Tag) -> TagView {
    TagView {
        id: tag.id,
        name: tag.name,
        parent_id: tag.parent_id,
    }
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<TagView>>, ServerError> {
    let tags = state.engine.list_tags().await?;
    Ok(Json(tags.into_iter().map(view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TagNew>,
) -> Result<Json<TagView>, ServerError> {
    let tag = state
        .engine
        .new_tag(&user::actor(&user), &payload.name, payload.parent_id)
        .await?;
    Ok(Json(view(tag)))
}

pub async fn rename(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagRename>,
) -> Result<Json<TagView>, ServerError> {
    let tag = state
        .engine
        .rename_tag(&user::actor(&user), id, &payload.name)
        .await?;
    Ok(Json(view(tag)))
}

pub async fn reparent(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagReparent>,
) -> Result<Json<TagView>, ServerError> {
    let tag = state
        .engine
        .set_tag_parent(&user::actor(&user), id, payload.parent_id)
        .await?;
    Ok(Json(view(tag)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state.engine.delete_tag(&user::actor(&user), id).await?;
    Ok(Json(()))
}
