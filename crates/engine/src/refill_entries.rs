//! Per-owner shares of an LPG refill.
//!
//! Readings and derived amounts are stored as `f64` and rounded only at
//! presentation, so the allocation invariants (Σ percentage = 100,
//! Σ subtotal = bill) hold within floating-point tolerance instead of
//! accumulating per-apartment rounding error.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefillEntry {
    pub id: Uuid,
    pub refill_id: Uuid,
    pub owner_id: Uuid,
    pub previous_reading: f64,
    pub current_reading: f64,
    pub consumption: f64,
    pub percentage: f64,
    pub subtotal: f64,
    pub total_amount: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lpg_refill_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub refill_id: String,
    pub owner_id: String,
    pub previous_reading: f64,
    pub current_reading: f64,
    pub consumption: f64,
    pub percentage: f64,
    pub subtotal: f64,
    pub total_amount: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::refills::Entity",
        from = "Column::RefillId",
        to = "super::refills::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Refills,
    #[sea_orm(
        belongs_to = "super::owners::Entity",
        from = "Column::OwnerId",
        to = "super::owners::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owners,
}

impl Related<super::refills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Refills.def()
    }
}

impl Related<super::owners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RefillEntry> for ActiveModel {
    fn from(entry: &RefillEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            refill_id: ActiveValue::Set(entry.refill_id.to_string()),
            owner_id: ActiveValue::Set(entry.owner_id.to_string()),
            previous_reading: ActiveValue::Set(entry.previous_reading),
            current_reading: ActiveValue::Set(entry.current_reading),
            consumption: ActiveValue::Set(entry.consumption),
            percentage: ActiveValue::Set(entry.percentage),
            subtotal: ActiveValue::Set(entry.subtotal),
            total_amount: ActiveValue::Set(entry.total_amount),
        }
    }
}

impl TryFrom<Model> for RefillEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid refill entry id".to_string()))?,
            refill_id: Uuid::parse_str(&model.refill_id)
                .map_err(|_| EngineError::InvalidId("invalid refill id".to_string()))?,
            owner_id: Uuid::parse_str(&model.owner_id)
                .map_err(|_| EngineError::InvalidId("invalid owner id".to_string()))?,
            previous_reading: model.previous_reading,
            current_reading: model.current_reading,
            consumption: model.consumption,
            percentage: model.percentage,
            subtotal: model.subtotal,
            total_amount: model.total_amount,
        })
    }
}
