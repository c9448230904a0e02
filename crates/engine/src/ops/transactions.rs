//! Ledger transaction operations: manual entry, staff edits, tag
//! assignment, and filtered listing with cursor pagination.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Tag, Transaction, TransactionKind,
    commands::{NewTransactionCmd, UpdateTransactionCmd},
    tags, transaction_tags, transactions,
};

use super::{Actor, Engine, normalize_required_text, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
/// Filtering by tag includes transactions tagged with the tag itself or any
/// of its direct children.
#[derive(Clone, Debug)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<TransactionKind>,
    pub owner_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    /// Duplicates are part of the ledger; hide them only on request.
    pub include_duplicates: bool,
}

impl Default for TransactionListFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            kind: None,
            owner_id: None,
            tag_id: None,
            include_duplicates: true,
        }
    }
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidInput(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    occurred_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidInput("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidInput("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidInput("invalid transactions cursor".to_string()))
    }
}

impl Engine {
    /// Creates a manual ledger entry (no batch, no bank description).
    pub async fn new_transaction(
        &self,
        actor: &Actor,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<Transaction> {
        self.require_admin(actor, "create transaction")?;
        let description = normalize_required_text(&cmd.description, "description")?;

        let tx = with_tx!(self, |db_tx| {
            if let Some(owner_id) = cmd.owner_id {
                self.require_owner(&db_tx, owner_id).await?;
            }
            for tag_id in &cmd.tag_ids {
                self.require_tag(&db_tx, *tag_id).await?;
            }

            let mut tx = Transaction::new(
                cmd.kind,
                cmd.amount,
                cmd.occurred_at,
                description,
                actor.username.clone(),
            )?;
            tx.owner_id = cmd.owner_id;
            tx.category = cmd.category.clone();
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            for tag_id in &cmd.tag_ids {
                let join = transaction_tags::ActiveModel {
                    transaction_id: ActiveValue::Set(tx.id.to_string()),
                    tag_id: ActiveValue::Set(tag_id.to_string()),
                };
                join.insert(&db_tx).await?;
            }
            Ok(tx)
        })?;

        self.audit
            .log_create(
                "transaction",
                &tx.id.to_string(),
                &actor.username,
                serde_json::json!({
                    "kind": tx.kind.as_str(),
                    "amount_minor": tx.amount.cents(),
                }),
            )
            .await;
        Ok(tx)
    }

    /// Applies staff edits to a transaction. The imported
    /// `bank_description` is immutable; only the working description, owner,
    /// and category can change.
    pub async fn update_transaction(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        self.require_admin(actor, "update transaction")?;

        let tx = with_tx!(self, |db_tx| {
            let model = self.require_transaction(&db_tx, transaction_id).await?;

            let mut active_model = transactions::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            if let Some(description) = cmd.description.as_deref() {
                active_model.description =
                    ActiveValue::Set(normalize_required_text(description, "description")?);
            }
            if let Some(owner_id) = cmd.owner_id {
                if let Some(id) = owner_id {
                    self.require_owner(&db_tx, id).await?;
                }
                active_model.owner_id = ActiveValue::Set(owner_id.map(|id| id.to_string()));
            }
            if let Some(category) = &cmd.category {
                active_model.category = ActiveValue::Set(category.clone());
            }
            Transaction::try_from(active_model.update(&db_tx).await?)
        })?;

        self.audit
            .log_update(
                "transaction",
                &tx.id.to_string(),
                &actor.username,
                serde_json::json!({ "description": tx.description, "owner_id": tx.owner_id }),
            )
            .await;
        Ok(tx)
    }

    /// Attaches a tag to a transaction (idempotent).
    pub async fn assign_tag(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        tag_id: Uuid,
    ) -> ResultEngine<()> {
        self.require_admin(actor, "assign tag")?;

        with_tx!(self, |db_tx| {
            self.require_transaction(&db_tx, transaction_id).await?;
            self.require_tag(&db_tx, tag_id).await?;

            let already = transaction_tags::Entity::find_by_id((
                transaction_id.to_string(),
                tag_id.to_string(),
            ))
            .one(&db_tx)
            .await?
            .is_some();
            if !already {
                let join = transaction_tags::ActiveModel {
                    transaction_id: ActiveValue::Set(transaction_id.to_string()),
                    tag_id: ActiveValue::Set(tag_id.to_string()),
                };
                join.insert(&db_tx).await?;
            }
            Ok(())
        })?;

        self.audit
            .log_update(
                "transaction",
                &transaction_id.to_string(),
                &actor.username,
                serde_json::json!({ "tag_added": tag_id }),
            )
            .await;
        Ok(())
    }

    /// Detaches a tag from a transaction.
    pub async fn remove_tag(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        tag_id: Uuid,
    ) -> ResultEngine<()> {
        self.require_admin(actor, "remove tag")?;

        let deleted = transaction_tags::Entity::delete_by_id((
            transaction_id.to_string(),
            tag_id.to_string(),
        ))
        .exec(&self.database)
        .await?;
        if deleted.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("tag not assigned".to_string()));
        }

        self.audit
            .log_update(
                "transaction",
                &transaction_id.to_string(),
                &actor.username,
                serde_json::json!({ "tag_removed": tag_id }),
            )
            .await;
        Ok(())
    }

    /// Returns one transaction with its tags.
    pub async fn transaction_with_tags(
        &self,
        transaction_id: Uuid,
    ) -> ResultEngine<(Transaction, Vec<Tag>)> {
        with_tx!(self, |db_tx| {
            let model = self.require_transaction(&db_tx, transaction_id).await?;
            let tag_models: Vec<(transaction_tags::Model, Option<tags::Model>)> =
                transaction_tags::Entity::find()
                    .filter(transaction_tags::Column::TransactionId.eq(model.id.clone()))
                    .find_also_related(tags::Entity)
                    .all(&db_tx)
                    .await?;

            let tx = Transaction::try_from(model)?;
            let mut tag_list = Vec::with_capacity(tag_models.len());
            for (_, tag_model) in tag_models {
                let Some(tag_model) = tag_model else { continue };
                tag_list.push(Tag::try_from(tag_model)?);
            }
            Ok((tx, tag_list))
        })
    }

    /// Lists transactions with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(occurred_at DESC, id DESC)`.
    pub async fn list_transactions_page(
        &self,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            validate_list_filter(filter)?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::OccurredAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::OccurredAt.lt(to));
            }
            if let Some(kind) = filter.kind {
                query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
            }
            if let Some(owner_id) = filter.owner_id {
                query = query.filter(transactions::Column::OwnerId.eq(owner_id.to_string()));
            }
            if !filter.include_duplicates {
                query = query.filter(transactions::Column::IsDuplicate.eq(false));
            }
            if let Some(tag_id) = filter.tag_id {
                let expanded = self.expand_tag_ids(&db_tx, tag_id).await?;
                query = query
                    .join(
                        sea_orm::JoinType::InnerJoin,
                        transactions::Relation::TransactionTags.def(),
                    )
                    .filter(transaction_tags::Column::TagId.is_in(expanded))
                    .distinct();
            }

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::OccurredAt.lt(cursor.occurred_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::OccurredAt.eq(cursor.occurred_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<Transaction> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(Transaction::try_from(model)?);
            }

            let next_cursor = out.last().map(|tx| TransactionsCursor {
                occurred_at: tx.occurred_at,
                transaction_id: tx.id.to_string(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }

    /// Convenience wrapper returning just the first page.
    pub async fn list_transactions(
        &self,
        limit: u64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let (items, _next) = self.list_transactions_page(limit, None, filter).await?;
        Ok(items)
    }
}
