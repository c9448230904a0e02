//! Untyped string key/value rows.
//!
//! Holds the balance checkpoint (`current_balance` in cents, `balance_date`
//! RFC 3339). Values are overwritten in place; no history is kept.

use sea_orm::entity::prelude::*;

pub const CURRENT_BALANCE_KEY: &str = "current_balance";
pub const BALANCE_DATE_KEY: &str = "balance_date";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "kv_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
