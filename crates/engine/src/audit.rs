//! Append-only audit trail.
//!
//! [`AuditLogger`] is explicit composition: ops call it after each mutating
//! operation instead of hiding the write in repository lifecycle hooks. A
//! failed audit write is logged and swallowed; it never fails the primary
//! operation.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, entity::prelude::*};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditEvent {
    Create,
    Update,
    Delete,
    SignIn,
    SignOut,
}

impl AuditEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::SignIn => "sign_in",
            Self::SignOut => "sign_out",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub actor: String,
    pub details: Option<String>,
    pub logged_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writes audit entries on a best-effort basis.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    database: DatabaseConnection,
}

impl AuditLogger {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub async fn log_create(
        &self,
        entity_type: &str,
        entity_id: &str,
        actor: &str,
        details: serde_json::Value,
    ) {
        self.log(AuditEvent::Create, entity_type, Some(entity_id), actor, Some(details))
            .await;
    }

    pub async fn log_update(
        &self,
        entity_type: &str,
        entity_id: &str,
        actor: &str,
        details: serde_json::Value,
    ) {
        self.log(AuditEvent::Update, entity_type, Some(entity_id), actor, Some(details))
            .await;
    }

    pub async fn log_delete(
        &self,
        entity_type: &str,
        entity_id: &str,
        actor: &str,
        details: serde_json::Value,
    ) {
        self.log(AuditEvent::Delete, entity_type, Some(entity_id), actor, Some(details))
            .await;
    }

    pub async fn log_sign_in(&self, actor: &str) {
        self.log(AuditEvent::SignIn, "session", None, actor, None)
            .await;
    }

    pub async fn log_sign_out(&self, actor: &str) {
        self.log(AuditEvent::SignOut, "session", None, actor, None)
            .await;
    }

    async fn log(
        &self,
        event: AuditEvent,
        entity_type: &str,
        entity_id: Option<&str>,
        actor: &str,
        details: Option<serde_json::Value>,
    ) {
        let entry = ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            event_type: ActiveValue::Set(event.as_str().to_string()),
            entity_type: ActiveValue::Set(entity_type.to_string()),
            entity_id: ActiveValue::Set(entity_id.map(ToString::to_string)),
            actor: ActiveValue::Set(actor.to_string()),
            details: ActiveValue::Set(details.map(|d| d.to_string())),
            logged_at: ActiveValue::Set(Utc::now()),
        };
        if let Err(err) = entry.insert(&self.database).await {
            tracing::warn!("audit write failed ({}/{entity_type}): {err}", event.as_str());
        }
    }
}
