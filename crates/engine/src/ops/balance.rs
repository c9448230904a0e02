//! Balance checkpoint and estimation.
//!
//! The checkpoint is an operator-entered pair (balance, date) in the
//! key/value store, overwritten on each update. The estimate is that balance
//! plus the signed sum of non-duplicate transactions on or after the
//! checkpoint date: `MoneyIn` adds, `MoneyOut` subtracts, using the same
//! canonical direction mapping as the parser.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, Statement, TransactionTrait, prelude::*};

use crate::{MoneyCents, ResultEngine, TransactionKind, kv};

use super::{Actor, Engine, with_tx};

/// The current estimate, or all-`None` when no checkpoint is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceEstimate {
    pub checkpoint_balance: Option<MoneyCents>,
    pub checkpoint_date: Option<DateTime<Utc>>,
    pub estimated_balance: Option<MoneyCents>,
    pub transactions_since: u64,
}

impl BalanceEstimate {
    fn empty() -> Self {
        Self {
            checkpoint_balance: None,
            checkpoint_date: None,
            estimated_balance: None,
            transactions_since: 0,
        }
    }
}

impl Engine {
    /// Overwrites the balance checkpoint.
    pub async fn set_balance_checkpoint(
        &self,
        actor: &Actor,
        balance: MoneyCents,
        date: DateTime<Utc>,
    ) -> ResultEngine<()> {
        self.require_admin(actor, "set balance checkpoint")?;

        with_tx!(self, |db_tx| {
            upsert_kv(&db_tx, kv::CURRENT_BALANCE_KEY, &balance.cents().to_string()).await?;
            upsert_kv(&db_tx, kv::BALANCE_DATE_KEY, &date.to_rfc3339()).await?;
            Ok(())
        })?;

        self.audit
            .log_update(
                "balance_checkpoint",
                kv::CURRENT_BALANCE_KEY,
                &actor.username,
                serde_json::json!({ "balance_minor": balance.cents(), "date": date }),
            )
            .await;
        Ok(())
    }

    /// The stored checkpoint, if any.
    pub async fn balance_checkpoint(&self) -> ResultEngine<Option<(MoneyCents, DateTime<Utc>)>> {
        let balance = kv::Entity::find_by_id(kv::CURRENT_BALANCE_KEY.to_string())
            .one(&self.database)
            .await?;
        let date = kv::Entity::find_by_id(kv::BALANCE_DATE_KEY.to_string())
            .one(&self.database)
            .await?;

        let (Some(balance), Some(date)) = (balance, date) else {
            return Ok(None);
        };

        let Ok(cents) = balance.value.parse::<i64>() else {
            tracing::warn!("unparseable balance checkpoint value: {}", balance.value);
            return Ok(None);
        };
        let Ok(date) = DateTime::parse_from_rfc3339(&date.value) else {
            tracing::warn!("unparseable balance checkpoint date: {}", date.value);
            return Ok(None);
        };
        Ok(Some((MoneyCents::new(cents), date.with_timezone(&Utc))))
    }

    /// Estimates the current account balance from the checkpoint and the
    /// ledger. Without a checkpoint, every field is `None`.
    pub async fn estimate_balance(&self) -> ResultEngine<BalanceEstimate> {
        let Some((checkpoint_balance, checkpoint_date)) = self.balance_checkpoint().await? else {
            return Ok(BalanceEstimate::empty());
        };

        let money_in = self
            .sum_since(checkpoint_date, TransactionKind::MoneyIn)
            .await?;
        let money_out = self
            .sum_since(checkpoint_date, TransactionKind::MoneyOut)
            .await?;
        let transactions_since = self.count_since(checkpoint_date).await?;

        let estimated = checkpoint_balance + MoneyCents::new(money_in) - MoneyCents::new(money_out);
        Ok(BalanceEstimate {
            checkpoint_balance: Some(checkpoint_balance),
            checkpoint_date: Some(checkpoint_date),
            estimated_balance: Some(estimated),
            transactions_since,
        })
    }

    async fn sum_since(&self, since: DateTime<Utc>, kind: TransactionKind) -> ResultEngine<i64> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
             FROM transactions \
             WHERE occurred_at >= ? AND is_duplicate = ? AND kind = ?",
            vec![since.into(), false.into(), kind.as_str().into()],
        );
        let row = self.database.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }

    async fn count_since(&self, since: DateTime<Utc>) -> ResultEngine<u64> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS cnt \
             FROM transactions \
             WHERE occurred_at >= ? AND is_duplicate = ?",
            vec![since.into(), false.into()],
        );
        let row = self.database.query_one(stmt).await?;
        let count: i64 = row.and_then(|r| r.try_get("", "cnt").ok()).unwrap_or(0);
        Ok(count.max(0) as u64)
    }
}

async fn upsert_kv(
    db_tx: &sea_orm::DatabaseTransaction,
    key: &str,
    value: &str,
) -> ResultEngine<()> {
    let existing = kv::Entity::find_by_id(key.to_string()).one(db_tx).await?;
    match existing {
        Some(_) => {
            let model = kv::ActiveModel {
                key: ActiveValue::Set(key.to_string()),
                value: ActiveValue::Set(value.to_string()),
            };
            model.update(db_tx).await?;
        }
        None => {
            let model = kv::ActiveModel {
                key: ActiveValue::Set(key.to_string()),
                value: ActiveValue::Set(value.to_string()),
            };
            model.insert(db_tx).await?;
        }
    }
    Ok(())
}
