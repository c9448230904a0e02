//! Statement import batches.
//!
//! One `Batch` row per CSV import run. The header is inserted with its final
//! counts in the same database transaction as its rows, so
//! `new_count + duplicate_count != total_count` can only mean an interrupted
//! import from an older data set and is exposed as a consistency signal.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub stored_filename: String,
    pub original_filename: String,
    pub processed_at: DateTime<Utc>,
    pub total_count: i32,
    pub new_count: i32,
    pub duplicate_count: i32,
}

impl Batch {
    /// True when the stored counts add up; false signals an interrupted
    /// import left by a pre-atomic version of the pipeline.
    pub fn is_consistent(&self) -> bool {
        self.new_count + self.duplicate_count == self.total_count
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub stored_filename: String,
    pub original_filename: String,
    pub processed_at: DateTimeUtc,
    pub total_count: i32,
    pub new_count: i32,
    pub duplicate_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Batch> for ActiveModel {
    fn from(batch: &Batch) -> Self {
        Self {
            id: ActiveValue::Set(batch.id.to_string()),
            stored_filename: ActiveValue::Set(batch.stored_filename.clone()),
            original_filename: ActiveValue::Set(batch.original_filename.clone()),
            processed_at: ActiveValue::Set(batch.processed_at),
            total_count: ActiveValue::Set(batch.total_count),
            new_count: ActiveValue::Set(batch.new_count),
            duplicate_count: ActiveValue::Set(batch.duplicate_count),
        }
    }
}

impl TryFrom<Model> for Batch {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid batch id".to_string()))?,
            stored_filename: model.stored_filename,
            original_filename: model.original_filename,
            processed_at: model.processed_at,
            total_count: model.total_count,
            new_count: model.new_count,
            duplicate_count: model.duplicate_count,
        })
    }
}
