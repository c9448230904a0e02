//! Statement import reconciliation.
//!
//! One import run: parse the file, classify every candidate against the
//! stored ledger, and persist the batch header (with its final counts) plus
//! every row in a single database transaction. A parse error aborts before
//! any side effect; a per-row failure rolls the whole batch back. Re-running
//! an import is safe: the duplicate key flags every row the second time.

use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Batch, PatternSet, ResultEngine, Transaction, batches, commands::ImportStatementCmd,
    owner_patterns, statement, transaction_tags, transactions,
};

use super::{Actor, Engine, with_tx};

/// Result of one statement import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportOutcome {
    pub batch_id: Uuid,
    /// Account number extracted from the statement metadata, when present.
    pub account: Option<String>,
    pub total: i32,
    pub new_count: i32,
    pub duplicate_count: i32,
}

impl Engine {
    /// Imports one statement file into a new batch.
    ///
    /// Duplicate detection matches each candidate's
    /// `(date, amount, kind, serial-if-present)` key against rows from prior
    /// imports. A duplicate is still persisted (flagged), and it copies
    /// forward the matched row's description, owner, and category so staff
    /// edits survive re-imports of overlapping statement periods.
    pub async fn import_statement(
        &self,
        actor: &Actor,
        cmd: ImportStatementCmd,
    ) -> ResultEngine<ImportOutcome> {
        self.require_admin(actor, "import statement")?;

        // Parser failures abort the import before anything is written.
        let parsed = statement::parse_statement(&cmd.text)?;
        let total = parsed.candidates.len() as i32;

        let outcome = with_tx!(self, |db_tx| {
            let pattern_set = if cmd.use_pattern_matching {
                let rows: Vec<(Uuid, Uuid, String)> = owner_patterns::Entity::find()
                    .filter(owner_patterns::Column::IsActive.eq(true))
                    .order_by_asc(owner_patterns::Column::CreatedAt)
                    .order_by_asc(owner_patterns::Column::Id)
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(crate::owner_patterns::OwnerPattern::try_from)
                    .collect::<ResultEngine<Vec<_>>>()?
                    .into_iter()
                    .map(|p| (p.id, p.owner_id, p.pattern))
                    .collect();
                PatternSet::compile(&rows)
            } else {
                PatternSet::default()
            };

            let batch_id = Uuid::new_v4();
            let mut rows: Vec<Transaction> = Vec::with_capacity(parsed.candidates.len());
            let mut new_count = 0;
            let mut duplicate_count = 0;

            // Classification pass. The batch header is not inserted yet, so
            // the duplicate lookup only ever sees rows from prior imports
            // and a statement with legitimate repeated rows cannot match
            // against itself.
            for candidate in &parsed.candidates {
                let mut query = transactions::Entity::find()
                    .filter(transactions::Column::OccurredAt.eq(candidate.occurred_at))
                    .filter(transactions::Column::AmountMinor.eq(candidate.amount.cents()))
                    .filter(transactions::Column::Kind.eq(candidate.kind.as_str()));
                if let Some(serial) = &candidate.serial {
                    query = query.filter(transactions::Column::Serial.eq(serial.clone()));
                }
                let matched = query.one(&db_tx).await?;

                let mut tx = Transaction::new(
                    candidate.kind,
                    candidate.amount,
                    candidate.occurred_at,
                    candidate.description.clone(),
                    actor.username.clone(),
                )?;
                tx.bank_description = Some(candidate.description.clone());
                tx.reference = candidate.reference.clone();
                tx.serial = candidate.serial.clone();
                tx.batch_id = Some(batch_id);

                match matched {
                    Some(existing) => {
                        // Copy forward staff edits from the matched row.
                        tx.is_duplicate = true;
                        tx.description = existing.description;
                        tx.owner_id = existing
                            .owner_id
                            .as_deref()
                            .and_then(|s| Uuid::parse_str(s).ok());
                        tx.category = existing.category;
                        duplicate_count += 1;
                    }
                    None => {
                        tx.owner_id = pattern_set
                            .first_match(&candidate.description)
                            .map(|p| p.target_id);
                        new_count += 1;
                    }
                }
                rows.push(tx);
            }

            let batch = Batch {
                id: batch_id,
                stored_filename: cmd.stored_filename.clone(),
                original_filename: cmd.original_filename.clone(),
                processed_at: Utc::now(),
                total_count: total,
                new_count,
                duplicate_count,
            };
            batches::ActiveModel::from(&batch).insert(&db_tx).await?;
            for tx in &rows {
                transactions::ActiveModel::from(tx).insert(&db_tx).await?;
            }

            Ok(ImportOutcome {
                batch_id,
                account: parsed.account,
                total,
                new_count,
                duplicate_count,
            })
        })?;

        tracing::info!(
            "imported {}: {} rows, {} new, {} duplicate",
            cmd.original_filename,
            outcome.total,
            outcome.new_count,
            outcome.duplicate_count
        );
        self.audit
            .log_create(
                "batch",
                &outcome.batch_id.to_string(),
                &actor.username,
                serde_json::json!({
                    "filename": cmd.original_filename,
                    "total": outcome.total,
                    "new": outcome.new_count,
                    "duplicates": outcome.duplicate_count,
                }),
            )
            .await;
        Ok(outcome)
    }

    /// Returns one batch header.
    pub async fn batch(&self, batch_id: Uuid) -> ResultEngine<Batch> {
        with_tx!(self, |db_tx| {
            let model = self.require_batch(&db_tx, batch_id).await?;
            Batch::try_from(model)
        })
    }

    /// Lists batches, newest first.
    pub async fn list_batches(&self) -> ResultEngine<Vec<Batch>> {
        let models = batches::Entity::find()
            .order_by_desc(batches::Column::ProcessedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Batch::try_from).collect()
    }

    /// Deletes a batch and all transactions it produced, in one transaction.
    pub async fn delete_batch(&self, actor: &Actor, batch_id: Uuid) -> ResultEngine<()> {
        self.require_admin(actor, "delete batch")?;

        with_tx!(self, |db_tx| {
            let model = self.require_batch(&db_tx, batch_id).await?;

            let tx_ids: Vec<String> = transactions::Entity::find()
                .filter(transactions::Column::BatchId.eq(model.id.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();

            if !tx_ids.is_empty() {
                transaction_tags::Entity::delete_many()
                    .filter(transaction_tags::Column::TransactionId.is_in(tx_ids))
                    .exec(&db_tx)
                    .await?;
            }
            transactions::Entity::delete_many()
                .filter(transactions::Column::BatchId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            batches::Entity::delete_by_id(model.id.clone())
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        self.audit
            .log_delete(
                "batch",
                &batch_id.to_string(),
                &actor.username,
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }
}
