//! Supporting-document attachments (bills, meter photos).
//!
//! The engine stores only metadata; the file bytes live in the configured
//! attachments directory and are written/unlinked at the server boundary.
//! The engine never inspects file contents.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// What kind of entity an attachment supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Refill,
    Transaction,
}

impl AttachmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Refill => "refill",
            Self::Transaction => "transaction",
        }
    }
}

impl TryFrom<&str> for AttachmentKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "refill" => Ok(Self::Refill),
            "transaction" => Ok(Self::Transaction),
            other => Err(EngineError::InvalidInput(format!(
                "invalid attachment kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub entity_kind: AttachmentKind,
    pub entity_id: Uuid,
    pub filename: String,
    /// Relative key inside the attachments directory.
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub entity_kind: String,
    pub entity_id: String,
    pub filename: String,
    pub storage_key: String,
    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Attachment> for ActiveModel {
    fn from(att: &Attachment) -> Self {
        Self {
            id: ActiveValue::Set(att.id.to_string()),
            entity_kind: ActiveValue::Set(att.entity_kind.as_str().to_string()),
            entity_id: ActiveValue::Set(att.entity_id.to_string()),
            filename: ActiveValue::Set(att.filename.clone()),
            storage_key: ActiveValue::Set(att.storage_key.clone()),
            uploaded_at: ActiveValue::Set(att.uploaded_at),
        }
    }
}

impl TryFrom<Model> for Attachment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid attachment id".to_string()))?,
            entity_kind: AttachmentKind::try_from(model.entity_kind.as_str())?,
            entity_id: Uuid::parse_str(&model.entity_id)
                .map_err(|_| EngineError::InvalidId("invalid attachment entity id".to_string()))?,
            filename: model.filename,
            storage_key: model.storage_key,
            uploaded_at: model.uploaded_at,
        })
    }
}
