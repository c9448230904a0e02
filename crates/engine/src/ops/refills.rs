//! LPG refill operations and payment reconciliation.
//!
//! Creating a refill persists the allocator's output atomically with the
//! header, so a refill can never exist with a subset of its entries. Payment
//! reconciliation matches `MoneyIn` ledger transactions carrying the
//! refill's tag against each owner's allocated share.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    MoneyCents, Refill, RefillEntry, ResultEngine, TransactionKind, allocation,
    commands::NewRefillCmd, refill_entries, refills, transaction_tags, transactions,
};

use super::{Actor, Engine, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
        }
    }
}

/// One owner's payment position against one refill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingPayment {
    pub owner_id: Uuid,
    pub amount_owed: f64,
    pub amount_paid: f64,
    pub remaining: f64,
    pub status: PaymentStatus,
}

/// One owner's position summed across every refill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OwnerPaymentTotals {
    pub owner_id: Uuid,
    pub total_owed: f64,
    pub total_paid: f64,
    pub remaining: f64,
}

/// Owed amounts are fractional; settle up at cent precision.
fn status_for(remaining: f64) -> PaymentStatus {
    if (remaining * 100.0).round() <= 0.0 {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    }
}

impl Engine {
    /// Records a refill and splits its bill across the given meter readings.
    ///
    /// The allocation is computed first (pure, validated); the refill header
    /// and all entries are then inserted in one transaction.
    pub async fn create_refill(
        &self,
        actor: &Actor,
        cmd: NewRefillCmd,
    ) -> ResultEngine<(Refill, Vec<RefillEntry>)> {
        self.require_admin(actor, "create refill")?;

        let allocations =
            allocation::allocate(cmd.bill_amount, cmd.efficiency_percent, &cmd.readings)?;

        let (refill, entries) = with_tx!(self, |db_tx| {
            if let Some(tag_id) = cmd.tag_id {
                self.require_tag(&db_tx, tag_id).await?;
            }
            for reading in &cmd.readings {
                self.require_owner(&db_tx, reading.owner_id).await?;
            }

            let refill = Refill {
                id: Uuid::new_v4(),
                bill_amount: cmd.bill_amount,
                gallons: cmd.gallons,
                refill_date: cmd.refill_date,
                efficiency_percent: cmd.efficiency_percent,
                tag_id: cmd.tag_id,
            };
            refills::ActiveModel::from(&refill).insert(&db_tx).await?;

            let mut entries = Vec::with_capacity(allocations.len());
            for (allocation, reading) in allocations.iter().zip(&cmd.readings) {
                let entry = RefillEntry {
                    id: Uuid::new_v4(),
                    refill_id: refill.id,
                    owner_id: allocation.owner_id,
                    previous_reading: reading.previous_reading,
                    current_reading: reading.current_reading,
                    consumption: allocation.consumption,
                    percentage: allocation.percentage,
                    subtotal: allocation.subtotal,
                    total_amount: allocation.total_amount,
                };
                refill_entries::ActiveModel::from(&entry)
                    .insert(&db_tx)
                    .await?;
                entries.push(entry);
            }
            Ok((refill, entries))
        })?;

        self.audit
            .log_create(
                "refill",
                &refill.id.to_string(),
                &actor.username,
                serde_json::json!({
                    "bill_amount_minor": refill.bill_amount.cents(),
                    "gallons": refill.gallons,
                    "entries": entries.len(),
                }),
            )
            .await;
        Ok((refill, entries))
    }

    /// Returns one refill with its entries.
    pub async fn refill(&self, refill_id: Uuid) -> ResultEngine<(Refill, Vec<RefillEntry>)> {
        with_tx!(self, |db_tx| {
            let model = self.require_refill(&db_tx, refill_id).await?;
            let entries = self.refill_entries(&db_tx, &model.id).await?;
            Ok((Refill::try_from(model)?, entries))
        })
    }

    /// Lists refills, newest first.
    pub async fn list_refills(&self) -> ResultEngine<Vec<Refill>> {
        let models = refills::Entity::find()
            .order_by_desc(refills::Column::RefillDate)
            .all(&self.database)
            .await?;
        models.into_iter().map(Refill::try_from).collect()
    }

    /// Deletes a refill and its entries.
    pub async fn delete_refill(&self, actor: &Actor, refill_id: Uuid) -> ResultEngine<()> {
        self.require_admin(actor, "delete refill")?;

        with_tx!(self, |db_tx| {
            let model = self.require_refill(&db_tx, refill_id).await?;
            refill_entries::Entity::delete_many()
                .filter(refill_entries::Column::RefillId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            refills::Entity::delete_by_id(model.id.clone())
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        self.audit
            .log_delete(
                "refill",
                &refill_id.to_string(),
                &actor.username,
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }

    /// Computes each owner's paid/owed position for one refill.
    ///
    /// Payments are `MoneyIn` transactions carrying the refill's tag,
    /// attributed to the owner, excluding flagged duplicates. A refill
    /// without a tag has no way to track payments, so everything owed is
    /// still outstanding.
    pub async fn pending_payments_for_refill(
        &self,
        refill_id: Uuid,
    ) -> ResultEngine<Vec<PendingPayment>> {
        with_tx!(self, |db_tx| {
            let model = self.require_refill(&db_tx, refill_id).await?;
            let refill = Refill::try_from(model)?;
            let entries = self.refill_entries(&db_tx, &refill.id.to_string()).await?;

            let mut out = Vec::with_capacity(entries.len());
            for entry in &entries {
                if entry.total_amount <= 0.0 {
                    continue;
                }
                let paid = match refill.tag_id {
                    Some(tag_id) => {
                        self.paid_amount(&db_tx, tag_id, entry.owner_id).await?
                    }
                    None => MoneyCents::ZERO,
                };
                let amount_paid = paid.as_units();
                let remaining = entry.total_amount - amount_paid;
                out.push(PendingPayment {
                    owner_id: entry.owner_id,
                    amount_owed: entry.total_amount,
                    amount_paid,
                    remaining,
                    status: status_for(remaining),
                });
            }
            Ok(out)
        })
    }

    /// Portfolio-wide pending-payments view: every owner's owed/paid totals
    /// summed across all refills.
    pub async fn pending_payments_summary(&self) -> ResultEngine<Vec<OwnerPaymentTotals>> {
        with_tx!(self, |db_tx| {
            let refill_models = refills::Entity::find().all(&db_tx).await?;

            let mut totals: HashMap<Uuid, OwnerPaymentTotals> = HashMap::new();
            for model in refill_models {
                let refill = Refill::try_from(model)?;
                let entries = self.refill_entries(&db_tx, &refill.id.to_string()).await?;
                for entry in &entries {
                    if entry.total_amount <= 0.0 {
                        continue;
                    }
                    let paid = match refill.tag_id {
                        Some(tag_id) => {
                            self.paid_amount(&db_tx, tag_id, entry.owner_id).await?
                        }
                        None => MoneyCents::ZERO,
                    };
                    let slot = totals.entry(entry.owner_id).or_insert(OwnerPaymentTotals {
                        owner_id: entry.owner_id,
                        total_owed: 0.0,
                        total_paid: 0.0,
                        remaining: 0.0,
                    });
                    slot.total_owed += entry.total_amount;
                    slot.total_paid += paid.as_units();
                    slot.remaining = slot.total_owed - slot.total_paid;
                }
            }

            let mut out: Vec<OwnerPaymentTotals> = totals.into_values().collect();
            out.sort_by(|a, b| {
                b.remaining
                    .partial_cmp(&a.remaining)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            Ok(out)
        })
    }

    async fn refill_entries(
        &self,
        db_tx: &DatabaseTransaction,
        refill_id: &str,
    ) -> ResultEngine<Vec<RefillEntry>> {
        let models = refill_entries::Entity::find()
            .filter(refill_entries::Column::RefillId.eq(refill_id.to_string()))
            .all(db_tx)
            .await?;
        models.into_iter().map(RefillEntry::try_from).collect()
    }

    /// Sum of money-in transactions carrying `tag_id`, attributed to
    /// `owner_id`, excluding duplicates.
    async fn paid_amount(
        &self,
        db_tx: &DatabaseTransaction,
        tag_id: Uuid,
        owner_id: Uuid,
    ) -> ResultEngine<MoneyCents> {
        let rows: Vec<transactions::Model> = transactions::Entity::find()
            .join(
                sea_orm::JoinType::InnerJoin,
                transactions::Relation::TransactionTags.def(),
            )
            .filter(transaction_tags::Column::TagId.eq(tag_id.to_string()))
            .filter(transactions::Column::OwnerId.eq(owner_id.to_string()))
            .filter(transactions::Column::Kind.eq(TransactionKind::MoneyIn.as_str()))
            .filter(transactions::Column::IsDuplicate.eq(false))
            .all(db_tx)
            .await?;

        let mut paid = MoneyCents::ZERO;
        for row in rows {
            paid += MoneyCents::new(row.amount_minor);
        }
        Ok(paid)
    }
}
