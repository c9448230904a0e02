//! Users table (auth-side entity).
//!
//! The server resolves Basic credentials against this table and passes an
//! [`engine::Actor`] into the ops layer.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn actor(user: &Model) -> engine::Actor {
    engine::Actor::new(user.username.clone(), user.is_admin)
}
