//! Owner attribution patterns.
//!
//! Each row is a user-maintained regular expression owned by one owner. The
//! pattern text is validated at creation time and never stored unless it
//! compiles. Owner attribution is first-match-wins in creation order
//! (`created_at, id` ascending), which the matcher makes explicit.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerPattern {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub pattern: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "owner_patterns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub pattern: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::owners::Entity",
        from = "Column::OwnerId",
        to = "super::owners::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owners,
}

impl Related<super::owners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&OwnerPattern> for ActiveModel {
    fn from(row: &OwnerPattern) -> Self {
        Self {
            id: ActiveValue::Set(row.id.to_string()),
            owner_id: ActiveValue::Set(row.owner_id.to_string()),
            pattern: ActiveValue::Set(row.pattern.clone()),
            is_active: ActiveValue::Set(row.is_active),
            created_at: ActiveValue::Set(row.created_at),
        }
    }
}

impl TryFrom<Model> for OwnerPattern {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid pattern id".to_string()))?,
            owner_id: Uuid::parse_str(&model.owner_id)
                .map_err(|_| EngineError::InvalidId("invalid owner id".to_string()))?,
            pattern: model.pattern,
            is_active: model.is_active,
            created_at: model.created_at,
        })
    }
}
