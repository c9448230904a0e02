//! Tag attribution patterns.
//!
//! Like owner patterns, but all active matches apply: one pass may attach
//! several tags to a transaction.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPattern {
    pub id: Uuid,
    pub tag_id: Uuid,
    pub pattern: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tag_patterns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tag_id: String,
    pub pattern: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tags::Entity",
        from = "Column::TagId",
        to = "super::tags::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Tags,
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&TagPattern> for ActiveModel {
    fn from(row: &TagPattern) -> Self {
        Self {
            id: ActiveValue::Set(row.id.to_string()),
            tag_id: ActiveValue::Set(row.tag_id.to_string()),
            pattern: ActiveValue::Set(row.pattern.clone()),
            is_active: ActiveValue::Set(row.is_active),
            created_at: ActiveValue::Set(row.created_at),
        }
    }
}

impl TryFrom<Model> for TagPattern {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid pattern id".to_string()))?,
            tag_id: Uuid::parse_str(&model.tag_id)
                .map_err(|_| EngineError::InvalidId("invalid tag id".to_string()))?,
            pattern: model.pattern,
            is_active: model.is_active,
            created_at: model.created_at,
        })
    }
}
