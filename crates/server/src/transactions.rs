//! Transactions API endpoints.

use api_types::transaction::{
    TagAssign, TransactionDetailResponse, TransactionGet, TransactionKind as ApiKind,
    TransactionList, TransactionListResponse, TransactionNew, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, tags, user};
use engine::{MoneyCents, NewTransactionCmd, TransactionListFilter, UpdateTransactionCmd};

pub(crate) fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::MoneyIn => ApiKind::MoneyIn,
        engine::TransactionKind::MoneyOut => ApiKind::MoneyOut,
    }
}

pub(crate) fn map_api_kind(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::MoneyIn => engine::TransactionKind::MoneyIn,
        ApiKind::MoneyOut => engine::TransactionKind::MoneyOut,
    }
}

fn view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount.cents(),
        occurred_at: tx.occurred_at,
        description: tx.description,
        bank_description: tx.bank_description,
        owner_id: tx.owner_id,
        category: tx.category,
        reference: tx.reference,
        serial: tx.serial,
        batch_id: tx.batch_id,
        is_duplicate: tx.is_duplicate,
    }
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);
    let filter = TransactionListFilter {
        from: payload.from,
        to: payload.to,
        kind: payload.kind.map(map_api_kind),
        owner_id: payload.owner_id,
        tag_id: payload.tag_id,
        include_duplicates: payload.include_duplicates.unwrap_or(true),
    };

    let (txs, next_cursor) = state
        .engine
        .list_transactions_page(limit, payload.cursor.as_deref(), &filter)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(view).collect(),
        next_cursor,
    }))
}

pub async fn get_detail(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionGet>,
) -> Result<Json<TransactionDetailResponse>, ServerError> {
    let (tx, tag_list) = state.engine.transaction_with_tags(payload.id).await?;
    Ok(Json(TransactionDetailResponse {
        transaction: view(tx),
        tags: tag_list.into_iter().map(tags::view).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<Json<TransactionView>, ServerError> {
    let mut cmd = NewTransactionCmd::new(
        map_api_kind(payload.kind),
        MoneyCents::new(payload.amount_minor),
        payload.occurred_at,
        payload.description,
    );
    if let Some(owner_id) = payload.owner_id {
        cmd = cmd.owner_id(owner_id);
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    for tag_id in payload.tag_ids {
        cmd = cmd.tag(tag_id);
    }

    let tx = state
        .engine
        .new_transaction(&user::actor(&user), cmd)
        .await?;
    Ok(Json(view(tx)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let mut cmd = UpdateTransactionCmd::new();
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if payload.clear_owner {
        cmd = cmd.clear_owner();
    } else if let Some(owner_id) = payload.owner_id {
        cmd = cmd.owner_id(owner_id);
    }
    if payload.clear_category {
        cmd = cmd.clear_category();
    } else if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }

    let tx = state
        .engine
        .update_transaction(&user::actor(&user), id, cmd)
        .await?;
    Ok(Json(view(tx)))
}

pub async fn assign_tag(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagAssign>,
) -> Result<Json<()>, ServerError> {
    state
        .engine
        .assign_tag(&user::actor(&user), id, payload.tag_id)
        .await?;
    Ok(Json(()))
}

pub async fn remove_tag(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<()>, ServerError> {
    state
        .engine
        .remove_tag(&user::actor(&user), id, tag_id)
        .await?;
    Ok(Json(()))
}
