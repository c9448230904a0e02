//! Pattern lifecycle: create, toggle, delete, retroactive application.
//!
//! Pattern text must compile before anything is stored. Retroactive
//! application deliberately is NOT one atomic transaction: it walks the
//! ledger in bounded chunks, each chunk its own transaction, so a large
//! backfill never holds a long lock. A failure partway leaves earlier chunks
//! applied; that state is logged and safe to retry.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, matcher,
    commands::{NewOwnerPatternCmd, NewTagPatternCmd},
    owner_patterns::{self, OwnerPattern},
    tag_patterns::{self, TagPattern},
    transaction_tags, transactions,
};

use super::{Actor, Engine, with_tx};

/// Rows touched per retroactive-application transaction.
const RETRO_CHUNK: u64 = 500;

/// What a retroactive pattern application did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetroactiveOutcome {
    pub scanned: u64,
    pub attributed: u64,
}

impl Engine {
    /// Creates an owner attribution pattern.
    ///
    /// The regex is validated first; an unparseable pattern is rejected with
    /// a validation error and never persisted. With `apply_to_existing`, the
    /// stored ledger is scanned afterwards (optionally restricted to
    /// unassigned transactions) and matches get the owner attributed.
    pub async fn create_owner_pattern(
        &self,
        actor: &Actor,
        cmd: NewOwnerPatternCmd,
    ) -> ResultEngine<(OwnerPattern, Option<RetroactiveOutcome>)> {
        self.require_admin(actor, "create pattern")?;
        matcher::validate_pattern(&cmd.pattern)?;

        let pattern = with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, cmd.owner_id).await?;
            let pattern = OwnerPattern {
                id: Uuid::new_v4(),
                owner_id: cmd.owner_id,
                pattern: cmd.pattern.clone(),
                is_active: true,
                created_at: Utc::now(),
            };
            owner_patterns::ActiveModel::from(&pattern)
                .insert(&db_tx)
                .await?;
            Ok(pattern)
        })?;

        self.audit
            .log_create(
                "owner_pattern",
                &pattern.id.to_string(),
                &actor.username,
                serde_json::json!({ "owner_id": pattern.owner_id, "pattern": pattern.pattern }),
            )
            .await;

        let outcome = if cmd.apply_to_existing {
            Some(
                self.apply_owner_pattern_retroactively(&pattern, cmd.only_unassigned)
                    .await?,
            )
        } else {
            None
        };
        Ok((pattern, outcome))
    }

    /// Creates a tag attribution pattern, optionally tagging the stored
    /// ledger retroactively.
    pub async fn create_tag_pattern(
        &self,
        actor: &Actor,
        cmd: NewTagPatternCmd,
    ) -> ResultEngine<(TagPattern, Option<RetroactiveOutcome>)> {
        self.require_admin(actor, "create pattern")?;
        matcher::validate_pattern(&cmd.pattern)?;

        let pattern = with_tx!(self, |db_tx| {
            self.require_tag(&db_tx, cmd.tag_id).await?;
            let pattern = TagPattern {
                id: Uuid::new_v4(),
                tag_id: cmd.tag_id,
                pattern: cmd.pattern.clone(),
                is_active: true,
                created_at: Utc::now(),
            };
            tag_patterns::ActiveModel::from(&pattern)
                .insert(&db_tx)
                .await?;
            Ok(pattern)
        })?;

        self.audit
            .log_create(
                "tag_pattern",
                &pattern.id.to_string(),
                &actor.username,
                serde_json::json!({ "tag_id": pattern.tag_id, "pattern": pattern.pattern }),
            )
            .await;

        let outcome = if cmd.apply_to_existing {
            Some(self.apply_tag_pattern_retroactively(&pattern).await?)
        } else {
            None
        };
        Ok((pattern, outcome))
    }

    /// Flips a pattern's active flag; returns the new state.
    pub async fn toggle_owner_pattern(
        &self,
        actor: &Actor,
        pattern_id: Uuid,
    ) -> ResultEngine<OwnerPattern> {
        self.require_admin(actor, "toggle pattern")?;

        let pattern = with_tx!(self, |db_tx| {
            let model = owner_patterns::Entity::find_by_id(pattern_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("pattern not exists".to_string()))?;
            let active_model = owner_patterns::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                is_active: ActiveValue::Set(!model.is_active),
                ..Default::default()
            };
            OwnerPattern::try_from(active_model.update(&db_tx).await?)
        })?;

        self.audit
            .log_update(
                "owner_pattern",
                &pattern.id.to_string(),
                &actor.username,
                serde_json::json!({ "is_active": pattern.is_active }),
            )
            .await;
        Ok(pattern)
    }

    /// Flips a tag pattern's active flag; returns the new state.
    pub async fn toggle_tag_pattern(
        &self,
        actor: &Actor,
        pattern_id: Uuid,
    ) -> ResultEngine<TagPattern> {
        self.require_admin(actor, "toggle pattern")?;

        let pattern = with_tx!(self, |db_tx| {
            let model = tag_patterns::Entity::find_by_id(pattern_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("pattern not exists".to_string()))?;
            let active_model = tag_patterns::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                is_active: ActiveValue::Set(!model.is_active),
                ..Default::default()
            };
            TagPattern::try_from(active_model.update(&db_tx).await?)
        })?;

        self.audit
            .log_update(
                "tag_pattern",
                &pattern.id.to_string(),
                &actor.username,
                serde_json::json!({ "is_active": pattern.is_active }),
            )
            .await;
        Ok(pattern)
    }

    /// Removes an owner pattern.
    pub async fn delete_owner_pattern(&self, actor: &Actor, pattern_id: Uuid) -> ResultEngine<()> {
        self.require_admin(actor, "delete pattern")?;

        let deleted = owner_patterns::Entity::delete_by_id(pattern_id.to_string())
            .exec(&self.database)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("pattern not exists".to_string()));
        }
        self.audit
            .log_delete(
                "owner_pattern",
                &pattern_id.to_string(),
                &actor.username,
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }

    /// Removes a tag pattern.
    pub async fn delete_tag_pattern(&self, actor: &Actor, pattern_id: Uuid) -> ResultEngine<()> {
        self.require_admin(actor, "delete pattern")?;

        let deleted = tag_patterns::Entity::delete_by_id(pattern_id.to_string())
            .exec(&self.database)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("pattern not exists".to_string()));
        }
        self.audit
            .log_delete(
                "tag_pattern",
                &pattern_id.to_string(),
                &actor.username,
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }

    /// Lists one owner's patterns in creation order.
    pub async fn list_owner_patterns(&self, owner_id: Uuid) -> ResultEngine<Vec<OwnerPattern>> {
        let models = owner_patterns::Entity::find()
            .filter(owner_patterns::Column::OwnerId.eq(owner_id.to_string()))
            .order_by_asc(owner_patterns::Column::CreatedAt)
            .order_by_asc(owner_patterns::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(OwnerPattern::try_from).collect()
    }

    /// Lists one tag's patterns in creation order.
    pub async fn list_tag_patterns(&self, tag_id: Uuid) -> ResultEngine<Vec<TagPattern>> {
        let models = tag_patterns::Entity::find()
            .filter(tag_patterns::Column::TagId.eq(tag_id.to_string()))
            .order_by_asc(tag_patterns::Column::CreatedAt)
            .order_by_asc(tag_patterns::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(TagPattern::try_from).collect()
    }

    async fn apply_owner_pattern_retroactively(
        &self,
        pattern: &OwnerPattern,
        only_unassigned: bool,
    ) -> ResultEngine<RetroactiveOutcome> {
        let rows = vec![(pattern.id, pattern.owner_id, pattern.pattern.clone())];
        let set = matcher::PatternSet::compile(&rows);

        let mut outcome = RetroactiveOutcome::default();
        let mut last_id: Option<String> = None;

        loop {
            let (scanned, attributed, next) = match self
                .owner_retro_chunk(&set, pattern.owner_id, only_unassigned, last_id.take())
                .await
            {
                Ok(values) => values,
                Err(err) => {
                    tracing::warn!(
                        "retroactive apply of pattern {} interrupted after {} rows ({} attributed): {err}",
                        pattern.id,
                        outcome.scanned,
                        outcome.attributed
                    );
                    return Err(err);
                }
            };

            outcome.scanned += scanned;
            outcome.attributed += attributed;
            last_id = next;
            if scanned < RETRO_CHUNK {
                break;
            }
        }

        tracing::info!(
            "pattern {} applied retroactively: {} scanned, {} attributed",
            pattern.id,
            outcome.scanned,
            outcome.attributed
        );
        Ok(outcome)
    }

    /// One bounded chunk of the owner backfill, in its own transaction.
    async fn owner_retro_chunk(
        &self,
        set: &matcher::PatternSet,
        owner_id: Uuid,
        only_unassigned: bool,
        last_id: Option<String>,
    ) -> ResultEngine<(u64, u64, Option<String>)> {
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .order_by_asc(transactions::Column::Id)
                .limit(RETRO_CHUNK);
            if only_unassigned {
                query = query.filter(transactions::Column::OwnerId.is_null());
            }
            if let Some(id) = &last_id {
                query = query.filter(transactions::Column::Id.gt(id.clone()));
            }
            let models = query.all(&db_tx).await?;

            let mut hits = 0u64;
            for model in &models {
                if set.first_match(&model.description).is_none() {
                    continue;
                }
                let update = transactions::ActiveModel {
                    id: ActiveValue::Set(model.id.clone()),
                    owner_id: ActiveValue::Set(Some(owner_id.to_string())),
                    ..Default::default()
                };
                update.update(&db_tx).await?;
                hits += 1;
            }
            let next = models.last().map(|m| m.id.clone());
            Ok((models.len() as u64, hits, next))
        })
    }

    async fn apply_tag_pattern_retroactively(
        &self,
        pattern: &TagPattern,
    ) -> ResultEngine<RetroactiveOutcome> {
        let rows = vec![(pattern.id, pattern.tag_id, pattern.pattern.clone())];
        let set = matcher::PatternSet::compile(&rows);

        let mut outcome = RetroactiveOutcome::default();
        let mut last_id: Option<String> = None;

        loop {
            let (scanned, attributed, next) = match self
                .tag_retro_chunk(&set, pattern.tag_id, last_id.take())
                .await
            {
                Ok(values) => values,
                Err(err) => {
                    tracing::warn!(
                        "retroactive apply of tag pattern {} interrupted after {} rows ({} tagged): {err}",
                        pattern.id,
                        outcome.scanned,
                        outcome.attributed
                    );
                    return Err(err);
                }
            };

            outcome.scanned += scanned;
            outcome.attributed += attributed;
            last_id = next;
            if scanned < RETRO_CHUNK {
                break;
            }
        }

        tracing::info!(
            "tag pattern {} applied retroactively: {} scanned, {} tagged",
            pattern.id,
            outcome.scanned,
            outcome.attributed
        );
        Ok(outcome)
    }

    /// One bounded chunk of the tag backfill, in its own transaction.
    async fn tag_retro_chunk(
        &self,
        set: &matcher::PatternSet,
        tag_id: Uuid,
        last_id: Option<String>,
    ) -> ResultEngine<(u64, u64, Option<String>)> {
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .order_by_asc(transactions::Column::Id)
                .limit(RETRO_CHUNK);
            if let Some(id) = &last_id {
                query = query.filter(transactions::Column::Id.gt(id.clone()));
            }
            let models = query.all(&db_tx).await?;

            let mut hits = 0u64;
            for model in &models {
                if set.first_match(&model.description).is_none() {
                    continue;
                }
                let already = transaction_tags::Entity::find_by_id((
                    model.id.clone(),
                    tag_id.to_string(),
                ))
                .one(&db_tx)
                .await?
                .is_some();
                if already {
                    continue;
                }
                let join = transaction_tags::ActiveModel {
                    transaction_id: ActiveValue::Set(model.id.clone()),
                    tag_id: ActiveValue::Set(tag_id.to_string()),
                };
                join.insert(&db_tx).await?;
                hits += 1;
            }
            let next = models.last().map(|m| m.id.clone());
            Ok((models.len() as u64, hits, next))
        })
    }
}
