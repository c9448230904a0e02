//! LPG refill API endpoints.

use api_types::refill::{
    PaymentStatus as ApiStatus, PendingPaymentView, PendingSummaryView, RefillDetailResponse,
    RefillEntryView, RefillNew, RefillView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};
use engine::{MeterReading, MoneyCents, NewRefillCmd, PaymentStatus};

fn refill_view(refill: engine::Refill) -> RefillView {
    RefillView {
        id: refill.id,
        bill_amount_minor: refill.bill_amount.cents(),
        gallons: refill.gallons,
        refill_date: refill.refill_date,
        efficiency_percent: refill.efficiency_percent,
        tag_id: refill.tag_id,
    }
}

fn entry_view(entry: engine::RefillEntry) -> RefillEntryView {
    RefillEntryView {
        owner_id: entry.owner_id,
        previous_reading: entry.previous_reading,
        current_reading: entry.current_reading,
        consumption: entry.consumption,
        percentage: entry.percentage,
        subtotal: entry.subtotal,
        total_amount: entry.total_amount,
    }
}

fn map_status(status: PaymentStatus) -> ApiStatus {
    match status {
        PaymentStatus::Paid => ApiStatus::Paid,
        PaymentStatus::Pending => ApiStatus::Pending,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RefillNew>,
) -> Result<Json<RefillDetailResponse>, ServerError> {
    let readings: Vec<MeterReading> = payload
        .readings
        .iter()
        .map(|r| MeterReading {
            owner_id: r.owner_id,
            previous_reading: r.previous_reading,
            current_reading: r.current_reading,
        })
        .collect();

    let mut cmd = NewRefillCmd::new(
        MoneyCents::new(payload.bill_amount_minor),
        payload.gallons,
        payload.refill_date,
        readings,
    );
    if let Some(percent) = payload.efficiency_percent {
        cmd = cmd.efficiency_percent(percent);
    }
    if let Some(tag_id) = payload.tag_id {
        cmd = cmd.tag_id(tag_id);
    }

    let (refill, entries) = state
        .engine
        .create_refill(&user::actor(&user), cmd)
        .await?;
    Ok(Json(RefillDetailResponse {
        refill: refill_view(refill),
        entries: entries.into_iter().map(entry_view).collect(),
    }))
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<RefillView>>, ServerError> {
    let refills = state.engine.list_refills().await?;
    Ok(Json(refills.into_iter().map(refill_view).collect()))
}

pub async fn get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefillDetailResponse>, ServerError> {
    let (refill, entries) = state.engine.refill(id).await?;
    Ok(Json(RefillDetailResponse {
        refill: refill_view(refill),
        entries: entries.into_iter().map(entry_view).collect(),
    }))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state.engine.delete_refill(&user::actor(&user), id).await?;
    Ok(Json(()))
}

pub async fn pending_payments(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PendingPaymentView>>, ServerError> {
    let payments = state.engine.pending_payments_for_refill(id).await?;
    Ok(Json(
        payments
            .into_iter()
            .map(|p| PendingPaymentView {
                owner_id: p.owner_id,
                amount_owed: p.amount_owed,
                amount_paid: p.amount_paid,
                remaining: p.remaining,
                status: map_status(p.status),
            })
            .collect(),
    ))
}

pub async fn summary(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<PendingSummaryView>>, ServerError> {
    let totals = state.engine.pending_payments_summary().await?;
    Ok(Json(
        totals
            .into_iter()
            .map(|t| PendingSummaryView {
                owner_id: t.owner_id,
                total_owed: t.total_owed,
                total_paid: t.total_paid,
                remaining: t.remaining,
            })
            .collect(),
    ))
}
