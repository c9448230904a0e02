//! Attachment metadata operations.
//!
//! File bytes never pass through the engine: the HTTP boundary writes them
//! under the configured attachments directory and calls these ops with the
//! resulting storage key. Deleting returns the record so the boundary can
//! unlink the file afterwards.

use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Attachment, AttachmentKind, EngineError, ResultEngine, attachments,
};

use super::{Actor, Engine, normalize_required_text, with_tx};

impl Engine {
    /// Records an uploaded supporting document for a refill or transaction.
    pub async fn add_attachment(
        &self,
        actor: &Actor,
        entity_kind: AttachmentKind,
        entity_id: Uuid,
        filename: &str,
        storage_key: &str,
    ) -> ResultEngine<Attachment> {
        self.require_admin(actor, "add attachment")?;
        let filename = normalize_required_text(filename, "filename")?;
        let storage_key = normalize_required_text(storage_key, "storage key")?;

        let attachment = with_tx!(self, |db_tx| {
            match entity_kind {
                AttachmentKind::Refill => {
                    self.require_refill(&db_tx, entity_id).await?;
                }
                AttachmentKind::Transaction => {
                    self.require_transaction(&db_tx, entity_id).await?;
                }
            }

            let attachment = Attachment {
                id: Uuid::new_v4(),
                entity_kind,
                entity_id,
                filename,
                storage_key,
                uploaded_at: Utc::now(),
            };
            attachments::ActiveModel::from(&attachment)
                .insert(&db_tx)
                .await?;
            Ok(attachment)
        })?;

        self.audit
            .log_create(
                "attachment",
                &attachment.id.to_string(),
                &actor.username,
                serde_json::json!({
                    "entity_kind": attachment.entity_kind.as_str(),
                    "entity_id": attachment.entity_id,
                    "filename": attachment.filename,
                }),
            )
            .await;
        Ok(attachment)
    }

    /// Returns one attachment record.
    pub async fn attachment(&self, attachment_id: Uuid) -> ResultEngine<Attachment> {
        let model = attachments::Entity::find_by_id(attachment_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("attachment not exists".to_string()))?;
        Attachment::try_from(model)
    }

    /// Lists attachments for one entity, oldest first.
    pub async fn attachments_for(
        &self,
        entity_kind: AttachmentKind,
        entity_id: Uuid,
    ) -> ResultEngine<Vec<Attachment>> {
        let models = attachments::Entity::find()
            .filter(attachments::Column::EntityKind.eq(entity_kind.as_str()))
            .filter(attachments::Column::EntityId.eq(entity_id.to_string()))
            .order_by_asc(attachments::Column::UploadedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Attachment::try_from).collect()
    }

    /// Deletes an attachment record and returns it, so the caller can
    /// unlink the stored file.
    pub async fn delete_attachment(
        &self,
        actor: &Actor,
        attachment_id: Uuid,
    ) -> ResultEngine<Attachment> {
        self.require_admin(actor, "delete attachment")?;

        let attachment = with_tx!(self, |db_tx| {
            let model = attachments::Entity::find_by_id(attachment_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("attachment not exists".to_string()))?;
            let attachment = Attachment::try_from(model.clone())?;
            attachments::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok(attachment)
        })?;

        self.audit
            .log_delete(
                "attachment",
                &attachment_id.to_string(),
                &actor.username,
                serde_json::json!({ "storage_key": attachment.storage_key }),
            )
            .await;
        Ok(attachment)
    }
}
