//! Owner API endpoints.

use api_types::owner::{OwnerNew, OwnerUpdate, OwnerView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::{NewOwnerCmd, UpdateOwnerCmd};

fn view(owner: engine::Owner) -> OwnerView {
    OwnerView {
        id: owner.id,
        name: owner.name,
        apartment: owner.apartment,
        email: owner.email,
        phone: owner.phone,
        active: owner.active,
    }
}

#[derive(Deserialize)]
pub struct ListParams {
    include_inactive: Option<bool>,
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OwnerView>>, ServerError> {
    let owners = state
        .engine
        .list_owners(params.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(owners.into_iter().map(view).collect()))
}

pub async fn get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OwnerView>, ServerError> {
    let owner = state.engine.owner(id).await?;
    Ok(Json(view(owner)))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<OwnerNew>,
) -> Result<Json<OwnerView>, ServerError> {
    let mut cmd = NewOwnerCmd::new(payload.name, payload.apartment);
    if let Some(email) = payload.email {
        cmd = cmd.email(email);
    }
    if let Some(phone) = payload.phone {
        cmd = cmd.phone(phone);
    }
    let owner = state.engine.new_owner(&user::actor(&user), cmd).await?;
    Ok(Json(view(owner)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OwnerUpdate>,
) -> Result<Json<OwnerView>, ServerError> {
    let mut cmd = UpdateOwnerCmd::new();
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if payload.clear_email {
        cmd = cmd.email(None);
    } else if let Some(email) = payload.email {
        cmd = cmd.email(Some(email));
    }
    if payload.clear_phone {
        cmd = cmd.phone(None);
    } else if let Some(phone) = payload.phone {
        cmd = cmd.phone(Some(phone));
    }
    if let Some(active) = payload.active {
        cmd = cmd.active(active);
    }
    let owner = state
        .engine
        .update_owner(&user::actor(&user), id, cmd)
        .await?;
    Ok(Json(view(owner)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state.engine.delete_owner(&user::actor(&user), id).await?;
    Ok(Json(()))
}
