//! Owner CRUD.

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Owner, ResultEngine,
    commands::{NewOwnerCmd, UpdateOwnerCmd},
    owner_patterns, owners, refill_entries, transactions,
};

use super::{Actor, Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Registers a new apartment owner. The apartment identifier is unique.
    pub async fn new_owner(&self, actor: &Actor, cmd: NewOwnerCmd) -> ResultEngine<Owner> {
        self.require_admin(actor, "create owner")?;
        let name = normalize_required_text(&cmd.name, "owner name")?;
        let apartment = normalize_required_text(&cmd.apartment, "apartment")?;

        let owner = with_tx!(self, |db_tx| {
            let taken = owners::Entity::find()
                .filter(owners::Column::Apartment.eq(apartment.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(apartment));
            }

            let mut owner = Owner::new(name, apartment);
            owner.email = normalize_optional_text(cmd.email.as_deref());
            owner.phone = normalize_optional_text(cmd.phone.as_deref());
            owners::ActiveModel::from(&owner).insert(&db_tx).await?;
            Ok(owner)
        })?;

        self.audit
            .log_create(
                "owner",
                &owner.id.to_string(),
                &actor.username,
                serde_json::json!({ "name": owner.name, "apartment": owner.apartment }),
            )
            .await;
        Ok(owner)
    }

    /// Updates an owner's contact fields or active flag.
    pub async fn update_owner(
        &self,
        actor: &Actor,
        owner_id: Uuid,
        cmd: UpdateOwnerCmd,
    ) -> ResultEngine<Owner> {
        self.require_admin(actor, "update owner")?;

        let owner = with_tx!(self, |db_tx| {
            let model = self.require_owner(&db_tx, owner_id).await?;

            let mut active_model = owners::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            if let Some(name) = cmd.name.as_deref() {
                active_model.name = ActiveValue::Set(normalize_required_text(name, "owner name")?);
            }
            if let Some(email) = &cmd.email {
                active_model.email = ActiveValue::Set(normalize_optional_text(email.as_deref()));
            }
            if let Some(phone) = &cmd.phone {
                active_model.phone = ActiveValue::Set(normalize_optional_text(phone.as_deref()));
            }
            if let Some(active) = cmd.active {
                active_model.active = ActiveValue::Set(active);
            }
            let updated = active_model.update(&db_tx).await?;
            Owner::try_from(updated)
        })?;

        self.audit
            .log_update(
                "owner",
                &owner.id.to_string(),
                &actor.username,
                serde_json::json!({ "active": owner.active }),
            )
            .await;
        Ok(owner)
    }

    /// Returns one owner.
    pub async fn owner(&self, owner_id: Uuid) -> ResultEngine<Owner> {
        with_tx!(self, |db_tx| {
            let model = self.require_owner(&db_tx, owner_id).await?;
            Owner::try_from(model)
        })
    }

    /// Lists owners, ordered by apartment.
    pub async fn list_owners(&self, include_inactive: bool) -> ResultEngine<Vec<Owner>> {
        let mut query = owners::Entity::find().order_by_asc(owners::Column::Apartment);
        if !include_inactive {
            query = query.filter(owners::Column::Active.eq(true));
        }
        let models = query.all(&self.database).await?;
        models.into_iter().map(Owner::try_from).collect()
    }

    /// Deletes an owner: its patterns go with it, its transactions are
    /// detached (weak reference). An owner that participated in a refill
    /// cannot be deleted, because that would break the refill's allocation.
    pub async fn delete_owner(&self, actor: &Actor, owner_id: Uuid) -> ResultEngine<()> {
        self.require_admin(actor, "delete owner")?;

        with_tx!(self, |db_tx| {
            let model = self.require_owner(&db_tx, owner_id).await?;

            let referenced = refill_entries::Entity::find()
                .filter(refill_entries::Column::OwnerId.eq(model.id.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if referenced {
                return Err(EngineError::InvalidInput(
                    "owner has refill entries; deactivate it instead".to_string(),
                ));
            }

            owner_patterns::Entity::delete_many()
                .filter(owner_patterns::Column::OwnerId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;

            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::OwnerId,
                    Expr::value(Option::<String>::None),
                )
                .filter(transactions::Column::OwnerId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;

            owners::Entity::delete_by_id(model.id.clone())
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        self.audit
            .log_delete(
                "owner",
                &owner_id.to_string(),
                &actor.username,
                serde_json::json!({}),
            )
            .await;
        Ok(())
    }
}
