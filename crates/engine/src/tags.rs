//! Transaction tags.
//!
//! Tags label transactions (e.g. "LPG 2026-03" for one refill's payments).
//! A tag may have a single parent, giving one level of hierarchy. Cycles,
//! including self-reference, are rejected at write time by the ops layer;
//! the schema itself does not prevent them.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

impl Tag {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            parent_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tag_patterns::Entity")]
    TagPatterns,
    #[sea_orm(has_many = "super::transaction_tags::Entity")]
    TransactionTags,
}

impl Related<super::tag_patterns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TagPatterns.def()
    }
}

impl Related<super::transaction_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Tag> for ActiveModel {
    fn from(tag: &Tag) -> Self {
        Self {
            id: ActiveValue::Set(tag.id.to_string()),
            name: ActiveValue::Set(tag.name.clone()),
            parent_id: ActiveValue::Set(tag.parent_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for Tag {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid tag id".to_string()))?,
            name: model.name,
            parent_id: model
                .parent_id
                .as_deref()
                .map(|s| {
                    Uuid::parse_str(s)
                        .map_err(|_| EngineError::InvalidId("invalid tag id".to_string()))
                })
                .transpose()?,
        })
    }
}
