//! Ledger transactions.
//!
//! A `Transaction` is a single bank-ledger entry, created by a statement
//! import or by manual entry. `bank_description` is immutable once imported;
//! `description`, `owner_id`, and `category` are staff-editable. Duplicate
//! rows detected on re-import are retained and flagged, never discarded, so
//! batch totals stay auditable.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Direction of a ledger entry, seen from the account holder.
///
/// The bank's "credit"/"debit" wording maps canonically: credit = `MoneyIn`,
/// debit = `MoneyOut`. Every consumer (parser, balance estimator, payment
/// reconciler, API) uses this enum, never the bare bank strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    MoneyIn,
    MoneyOut,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MoneyIn => "money_in",
            Self::MoneyOut => "money_out",
        }
    }

    /// Sign applied when summing toward an estimated balance.
    pub fn signum(self) -> i64 {
        match self {
            Self::MoneyIn => 1,
            Self::MoneyOut => -1,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "money_in" => Ok(Self::MoneyIn),
            "money_out" => Ok(Self::MoneyOut),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    /// The description as imported from the bank, never edited.
    pub bank_description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub serial: Option<String>,
    pub batch_id: Option<Uuid>,
    pub is_duplicate: bool,
    pub created_by: String,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
        description: String,
        created_by: String,
    ) -> ResultEngine<Self> {
        if amount.is_negative() {
            return Err(EngineError::InvalidInput(
                "amount must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            occurred_at,
            description,
            bank_description: None,
            owner_id: None,
            category: None,
            reference: None,
            serial: None,
            batch_id: None,
            is_duplicate: false,
            created_by,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub occurred_at: DateTimeUtc,
    pub description: String,
    pub bank_description: Option<String>,
    pub owner_id: Option<String>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub serial: Option<String>,
    pub batch_id: Option<String>,
    pub is_duplicate: bool,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::owners::Entity",
        from = "Column::OwnerId",
        to = "super::owners::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owners,
    #[sea_orm(
        belongs_to = "super::batches::Entity",
        from = "Column::BatchId",
        to = "super::batches::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Batches,
    #[sea_orm(has_many = "super::transaction_tags::Entity")]
    TransactionTags,
}

impl Related<super::owners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owners.def()
    }
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::transaction_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            description: ActiveValue::Set(tx.description.clone()),
            bank_description: ActiveValue::Set(tx.bank_description.clone()),
            owner_id: ActiveValue::Set(tx.owner_id.map(|id| id.to_string())),
            category: ActiveValue::Set(tx.category.clone()),
            reference: ActiveValue::Set(tx.reference.clone()),
            serial: ActiveValue::Set(tx.serial.clone()),
            batch_id: ActiveValue::Set(tx.batch_id.map(|id| id.to_string())),
            is_duplicate: ActiveValue::Set(tx.is_duplicate),
            created_by: ActiveValue::Set(tx.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid transaction id".to_string()))?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            occurred_at: model.occurred_at,
            description: model.description,
            bank_description: model.bank_description,
            owner_id: model
                .owner_id
                .as_deref()
                .map(|s| {
                    Uuid::parse_str(s)
                        .map_err(|_| EngineError::InvalidId("invalid owner id".to_string()))
                })
                .transpose()?,
            category: model.category,
            reference: model.reference,
            serial: model.serial,
            batch_id: model
                .batch_id
                .as_deref()
                .map(|s| {
                    Uuid::parse_str(s)
                        .map_err(|_| EngineError::InvalidId("invalid batch id".to_string()))
                })
                .transpose()?,
            is_duplicate: model.is_duplicate,
            created_by: model.created_by,
        })
    }
}
