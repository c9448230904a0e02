//! Tag CRUD and hierarchy rules.
//!
//! The schema allows any `parent_id`; cycles (including self-reference) are
//! rejected here at write time. Hierarchy is one level by convention, so
//! "transactions with tag X" expands to X plus its direct children only.

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Tag, refills, tag_patterns, tags, transaction_tags,
};

use super::{Actor, Engine, normalize_required_text, with_tx};

impl Engine {
    /// Creates a tag, optionally under a parent.
    pub async fn new_tag(
        &self,
        actor: &Actor,
        name: &str,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Tag> {
        self.require_admin(actor, "create tag")?;
        let name = normalize_required_text(name, "tag name")?;

        let tag = with_tx!(self, |db_tx| {
            let taken = tags::Entity::find()
                .filter(tags::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(name));
            }
            if let Some(parent) = parent_id {
                self.require_tag(&db_tx, parent).await?;
            }

            let mut tag = Tag::new(name);
            tag.parent_id = parent_id;
            tags::ActiveModel::from(&tag).insert(&db_tx).await?;
            Ok(tag)
        })?;

        self.audit
            .log_create(
                "tag",
                &tag.id.to_string(),
                &actor.username,
                serde_json::json!({ "name": tag.name }),
            )
            .await;
        Ok(tag)
    }

    /// Renames a tag.
    pub async fn rename_tag(&self, actor: &Actor, tag_id: Uuid, name: &str) -> ResultEngine<Tag> {
        self.require_admin(actor, "rename tag")?;
        let name = normalize_required_text(name, "tag name")?;

        let tag = with_tx!(self, |db_tx| {
            let model = self.require_tag(&db_tx, tag_id).await?;
            let taken = tags::Entity::find()
                .filter(tags::Column::Name.eq(name.clone()))
                .filter(tags::Column::Id.ne(model.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(name));
            }
            let active_model = tags::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                name: ActiveValue::Set(name),
                ..Default::default()
            };
            Tag::try_from(active_model.update(&db_tx).await?)
        })?;

        self.audit
            .log_update(
                "tag",
                &tag.id.to_string(),
                &actor.username,
                serde_json::json!({ "name": tag.name }),
            )
            .await;
        Ok(tag)
    }

    /// Moves a tag under a new parent (or to the top level with `None`).
    ///
    /// Rejects self-reference and any assignment that would close a cycle.
    pub async fn set_tag_parent(
        &self,
        actor: &Actor,
        tag_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Tag> {
        self.require_admin(actor, "re-parent tag")?;

        let tag = with_tx!(self, |db_tx| {
            let model = self.require_tag(&db_tx, tag_id).await?;
            if let Some(parent) = parent_id {
                self.require_tag(&db_tx, parent).await?;
                self.ensure_no_tag_cycle(&db_tx, tag_id, parent).await?;
            }
            let active_model = tags::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                parent_id: ActiveValue::Set(parent_id.map(|id| id.to_string())),
                ..Default::default()
            };
            Tag::try_from(active_model.update(&db_tx).await?)
        })?;

        self.audit
            .log_update(
                "tag",
                &tag.id.to_string(),
                &actor.username,
                serde_json::json!({ "parent_id": tag.parent_id }),
            )
            .await;
        Ok(tag)
    }

    /// Returns one tag.
    pub async fn tag(&self, tag_id: Uuid) -> ResultEngine<Tag> {
        with_tx!(self, |db_tx| {
            let model = self.require_tag(&db_tx, tag_id).await?;
            Tag::try_from(model)
        })
    }

    /// Lists all tags ordered by name.
    pub async fn list_tags(&self) -> ResultEngine<Vec<Tag>> {
        let models = tags::Entity::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Tag::try_from).collect()
    }

    /// Deletes a tag: its patterns and join rows go with it, children move
    /// to the top level, and refills pointing at it are detached.
    pub async fn delete_tag(&self, actor: &Actor, tag_id: Uuid) -> ResultEngine<()> {
        self.require_admin(actor, "delete tag")?;

        with_tx!(self, |db_tx| {
            let model = self.require_tag(&db_tx, tag_id).await?;

            tag_patterns::Entity::delete_many()
                .filter(tag_patterns::Column::TagId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            transaction_tags::Entity::delete_many()
                .filter(transaction_tags::Column::TagId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            tags::Entity::update_many()
                .col_expr(tags::Column::ParentId, Expr::value(Option::<String>::None))
                .filter(tags::Column::ParentId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            refills::Entity::update_many()
                .col_expr(refills::Column::TagId, Expr::value(Option::<String>::None))
                .filter(refills::Column::TagId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            tags::Entity::delete_by_id(model.id.clone())
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        self.audit
            .log_delete(
                "tag",
                &tag_id.to_string(),
                &actor.username,
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }

    /// Walks up from `parent` and rejects if `tag_id` appears on the chain.
    async fn ensure_no_tag_cycle(
        &self,
        db_tx: &DatabaseTransaction,
        tag_id: Uuid,
        parent: Uuid,
    ) -> ResultEngine<()> {
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == tag_id {
                return Err(EngineError::InvalidInput(
                    "tag parent would create a cycle".to_string(),
                ));
            }
            let model = tags::Entity::find_by_id(current.to_string())
                .one(db_tx)
                .await?;
            cursor = match model.and_then(|m| m.parent_id) {
                Some(parent_id) => Some(
                    Uuid::parse_str(&parent_id)
                        .map_err(|_| EngineError::InvalidId("invalid tag id".to_string()))?,
                ),
                None => None,
            };
        }
        Ok(())
    }

    /// The tag itself plus its direct children, as stored ids. This is the
    /// one-hop expansion used by tag filtering, not a transitive closure.
    pub(super) async fn expand_tag_ids(
        &self,
        db_tx: &DatabaseTransaction,
        tag_id: Uuid,
    ) -> ResultEngine<Vec<String>> {
        self.require_tag(db_tx, tag_id).await?;
        let mut ids = vec![tag_id.to_string()];
        let children = tags::Entity::find()
            .filter(tags::Column::ParentId.eq(tag_id.to_string()))
            .all(db_tx)
            .await?;
        ids.extend(children.into_iter().map(|c| c.id));
        Ok(ids)
    }
}
