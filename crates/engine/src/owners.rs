//! Apartment owners.
//!
//! An `Owner` is the responsible party for one apartment. Owners hold regex
//! patterns that auto-attribute imported transactions to them; the reference
//! from transactions back to an owner is weak (deleting an owner detaches its
//! transactions instead of deleting them).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    /// Unique apartment identifier, e.g. "A-302".
    pub apartment: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
}

impl Owner {
    pub fn new(name: String, apartment: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            apartment,
            email: None,
            phone: None,
            active: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "owners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub apartment: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::owner_patterns::Entity")]
    OwnerPatterns,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::owner_patterns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnerPatterns.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Owner> for ActiveModel {
    fn from(owner: &Owner) -> Self {
        Self {
            id: ActiveValue::Set(owner.id.to_string()),
            name: ActiveValue::Set(owner.name.clone()),
            apartment: ActiveValue::Set(owner.apartment.clone()),
            email: ActiveValue::Set(owner.email.clone()),
            phone: ActiveValue::Set(owner.phone.clone()),
            active: ActiveValue::Set(owner.active),
        }
    }
}

impl TryFrom<Model> for Owner {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid owner id".to_string()))?,
            name: model.name,
            apartment: model.apartment,
            email: model.email,
            phone: model.phone,
            active: model.active,
        })
    }
}
