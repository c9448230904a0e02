//! Pattern API endpoints (owner and tag patterns).

use api_types::pattern::{
    OwnerPatternNew, PatternCreatedResponse, PatternView, RetroactiveView, TagPatternNew,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::{NewOwnerPatternCmd, NewTagPatternCmd, RetroactiveOutcome};

fn owner_pattern_view(p: engine::OwnerPattern) -> PatternView {
    PatternView {
        id: p.id,
        pattern: p.pattern,
        is_active: p.is_active,
        created_at: p.created_at,
    }
}

fn tag_pattern_view(p: engine::TagPattern) -> PatternView {
    PatternView {
        id: p.id,
        pattern: p.pattern,
        is_active: p.is_active,
        created_at: p.created_at,
    }
}

fn retroactive_view(outcome: RetroactiveOutcome) -> RetroactiveView {
    RetroactiveView {
        scanned: outcome.scanned,
        attributed: outcome.attributed,
    }
}

pub async fn list_for_owner(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PatternView>>, ServerError> {
    let patterns = state.engine.list_owner_patterns(id).await?;
    Ok(Json(patterns.into_iter().map(owner_pattern_view).collect()))
}

pub async fn create_for_owner(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OwnerPatternNew>,
) -> Result<Json<PatternCreatedResponse>, ServerError> {
    if payload.owner_id != id {
        return Err(ServerError::Generic(
            "owner_id does not match the path".to_string(),
        ));
    }
    let mut cmd = NewOwnerPatternCmd::new(payload.owner_id, payload.pattern);
    if payload.apply_to_existing {
        cmd = cmd.apply_to_existing(payload.only_unassigned);
    }
    let (pattern, outcome) = state
        .engine
        .create_owner_pattern(&user::actor(&user), cmd)
        .await?;
    Ok(Json(PatternCreatedResponse {
        pattern: owner_pattern_view(pattern),
        retroactive: outcome.map(retroactive_view),
    }))
}

pub async fn toggle_owner_pattern(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatternView>, ServerError> {
    let pattern = state
        .engine
        .toggle_owner_pattern(&user::actor(&user), id)
        .await?;
    Ok(Json(owner_pattern_view(pattern)))
}

pub async fn delete_owner_pattern(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state
        .engine
        .delete_owner_pattern(&user::actor(&user), id)
        .await?;
    Ok(Json(()))
}

pub async fn list_for_tag(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PatternView>>, ServerError> {
    let patterns = state.engine.list_tag_patterns(id).await?;
    Ok(Json(patterns.into_iter().map(tag_pattern_view).collect()))
}

pub async fn create_for_tag(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagPatternNew>,
) -> Result<Json<PatternCreatedResponse>, ServerError> {
    if payload.tag_id != id {
        return Err(ServerError::Generic(
            "tag_id does not match the path".to_string(),
        ));
    }
    let mut cmd = NewTagPatternCmd::new(payload.tag_id, payload.pattern);
    if payload.apply_to_existing {
        cmd = cmd.apply_to_existing();
    }
    let (pattern, outcome) = state
        .engine
        .create_tag_pattern(&user::actor(&user), cmd)
        .await?;
    Ok(Json(PatternCreatedResponse {
        pattern: tag_pattern_view(pattern),
        retroactive: outcome.map(retroactive_view),
    }))
}

pub async fn toggle_tag_pattern(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatternView>, ServerError> {
    let pattern = state
        .engine
        .toggle_tag_pattern(&user::actor(&user), id)
        .await?;
    Ok(Json(tag_pattern_view(pattern)))
}

pub async fn delete_tag_pattern(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state
        .engine
        .delete_tag_pattern(&user::actor(&user), id)
        .await?;
    Ok(Json(()))
}
