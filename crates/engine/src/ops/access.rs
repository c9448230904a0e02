//! Request identity and lookup guards.
//!
//! The authentication layer resolves the HTTP credentials into an [`Actor`];
//! every mutating op calls [`Engine::require_admin`] before touching any
//! state, so authorization failures can never leave partial side effects.

use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, batches, owners, refills, tags, transactions,
};

use super::Engine;

/// The identity performing an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            username: username.into(),
            is_admin,
        }
    }
}

/// Generates a `require_*` lookup returning the model or `KeyNotFound`.
macro_rules! impl_require_by_id {
    ($fn_name:ident, $entity:path, $model:path, $err_msg:literal) => {
        pub(super) async fn $fn_name(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    pub(super) fn require_admin(&self, actor: &Actor, action: &str) -> ResultEngine<()> {
        if !actor.is_admin {
            return Err(EngineError::Forbidden(action.to_string()));
        }
        Ok(())
    }

    impl_require_by_id!(
        require_owner,
        owners::Entity,
        owners::Model,
        "owner not exists"
    );

    impl_require_by_id!(require_tag, tags::Entity, tags::Model, "tag not exists");

    impl_require_by_id!(
        require_transaction,
        transactions::Entity,
        transactions::Model,
        "transaction not exists"
    );

    impl_require_by_id!(
        require_batch,
        batches::Entity,
        batches::Model,
        "batch not exists"
    );

    impl_require_by_id!(
        require_refill,
        refills::Entity,
        refills::Model,
        "refill not exists"
    );
}
