//! LPG tank refills.
//!
//! One `Refill` per billing event for the shared propane tank. The optional
//! tag links payment transactions in the ledger to this refill; the payment
//! reconciler sums `MoneyIn` transactions carrying that tag.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Refill {
    pub id: Uuid,
    pub bill_amount: MoneyCents,
    pub gallons: f64,
    pub refill_date: DateTime<Utc>,
    /// Surcharge applied on top of each proportional share, in percent.
    pub efficiency_percent: f64,
    pub tag_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lpg_refills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub bill_amount_minor: i64,
    pub gallons: f64,
    pub refill_date: DateTimeUtc,
    pub efficiency_percent: f64,
    pub tag_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::refill_entries::Entity")]
    RefillEntries,
    #[sea_orm(
        belongs_to = "super::tags::Entity",
        from = "Column::TagId",
        to = "super::tags::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Tags,
}

impl Related<super::refill_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefillEntries.def()
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Refill> for ActiveModel {
    fn from(refill: &Refill) -> Self {
        Self {
            id: ActiveValue::Set(refill.id.to_string()),
            bill_amount_minor: ActiveValue::Set(refill.bill_amount.cents()),
            gallons: ActiveValue::Set(refill.gallons),
            refill_date: ActiveValue::Set(refill.refill_date),
            efficiency_percent: ActiveValue::Set(refill.efficiency_percent),
            tag_id: ActiveValue::Set(refill.tag_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for Refill {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid refill id".to_string()))?,
            bill_amount: MoneyCents::new(model.bill_amount_minor),
            gallons: model.gallons,
            refill_date: model.refill_date,
            efficiency_percent: model.efficiency_percent,
            tag_id: model
                .tag_id
                .as_deref()
                .map(|s| {
                    Uuid::parse_str(s)
                        .map_err(|_| EngineError::InvalidId("invalid tag id".to_string()))
                })
                .transpose()?,
        })
    }
}
