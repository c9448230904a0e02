use chrono::{TimeZone, Utc};
use engine::{
    Actor, Engine, EngineError, MoneyCents, NewOwnerCmd, NewOwnerPatternCmd, NewTagPatternCmd,
    NewTransactionCmd, TransactionKind, UpdateTransactionCmd,
};
use migration::MigratorTrait;
use sea_orm::Database;
use uuid::Uuid;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn admin() -> Actor {
    Actor::new("alice", true)
}

async fn seed_transaction(engine: &Engine, description: &str) -> Uuid {
    let tx = engine
        .new_transaction(
            &admin(),
            NewTransactionCmd::new(
                TransactionKind::MoneyIn,
                MoneyCents::new(10_000),
                Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap(),
                description,
            ),
        )
        .await
        .unwrap();
    tx.id
}

#[tokio::test]
async fn invalid_regex_is_rejected_and_never_stored() {
    let engine = engine_with_db().await;
    let actor = admin();
    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();

    let err = engine
        .create_owner_pattern(&actor, NewOwnerPatternCmd::new(owner.id, "[unclosed"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPattern(_)));

    assert!(engine.list_owner_patterns(owner.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn retroactive_apply_only_unassigned_skips_owned_rows() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    let other = engine
        .new_owner(&actor, NewOwnerCmd::new("Juan Perez", "B-101"))
        .await
        .unwrap();

    let unassigned = seed_transaction(&engine, "ABONO RENT APT 302").await;
    let owned = seed_transaction(&engine, "ABONO RENT APT 101").await;
    let unrelated = seed_transaction(&engine, "ABONO ELECTRICIDAD").await;
    engine
        .update_transaction(&actor, owned, UpdateTransactionCmd::new().owner_id(other.id))
        .await
        .unwrap();

    let (_, outcome) = engine
        .create_owner_pattern(
            &actor,
            NewOwnerPatternCmd::new(owner.id, "RENT").apply_to_existing(true),
        )
        .await
        .unwrap();
    let outcome = outcome.unwrap();
    assert_eq!(outcome.attributed, 1);

    let (tx, _) = engine.transaction_with_tags(unassigned).await.unwrap();
    assert_eq!(tx.owner_id, Some(owner.id));
    // Previously-owned matching row is untouched.
    let (tx, _) = engine.transaction_with_tags(owned).await.unwrap();
    assert_eq!(tx.owner_id, Some(other.id));
    let (tx, _) = engine.transaction_with_tags(unrelated).await.unwrap();
    assert_eq!(tx.owner_id, None);
}

#[tokio::test]
async fn retroactive_apply_can_reassign_owned_rows() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    let other = engine
        .new_owner(&actor, NewOwnerCmd::new("Juan Perez", "B-101"))
        .await
        .unwrap();

    let owned = seed_transaction(&engine, "ABONO RENT APT 101").await;
    engine
        .update_transaction(&actor, owned, UpdateTransactionCmd::new().owner_id(other.id))
        .await
        .unwrap();

    let (_, outcome) = engine
        .create_owner_pattern(
            &actor,
            NewOwnerPatternCmd::new(owner.id, "RENT").apply_to_existing(false),
        )
        .await
        .unwrap();
    assert_eq!(outcome.unwrap().attributed, 1);

    let (tx, _) = engine.transaction_with_tags(owned).await.unwrap();
    assert_eq!(tx.owner_id, Some(owner.id));
}

#[tokio::test]
async fn toggled_off_patterns_are_not_evaluated() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    let (pattern, _) = engine
        .create_owner_pattern(&actor, NewOwnerPatternCmd::new(owner.id, "RENT"))
        .await
        .unwrap();

    let toggled = engine
        .toggle_owner_pattern(&actor, pattern.id)
        .await
        .unwrap();
    assert!(!toggled.is_active);

    engine
        .import_statement(
            &actor,
            engine::ImportStatementCmd::new(
                "uno.csv",
                "Fecha;Descripcion;Monto\n05/03/2026;ABONO RENT APT 302;100.00\n",
            ),
        )
        .await
        .unwrap();

    let txs = engine
        .list_transactions(10, &engine::TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].owner_id, None);
}

#[tokio::test]
async fn deleting_a_pattern_removes_it() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    let (pattern, _) = engine
        .create_owner_pattern(&actor, NewOwnerPatternCmd::new(owner.id, "RENT"))
        .await
        .unwrap();

    engine.delete_owner_pattern(&actor, pattern.id).await.unwrap();
    assert!(engine.list_owner_patterns(owner.id).await.unwrap().is_empty());

    let err = engine
        .delete_owner_pattern(&actor, pattern.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn tag_pattern_applies_retroactively_without_duplicating_joins() {
    let engine = engine_with_db().await;
    let actor = admin();

    let tag = engine.new_tag(&actor, "lpg", None).await.unwrap();
    let tagged = seed_transaction(&engine, "ABONO GAS PROPANO").await;
    seed_transaction(&engine, "ABONO RENTA").await;

    let (_, outcome) = engine
        .create_tag_pattern(
            &actor,
            NewTagPatternCmd::new(tag.id, "PROPANO").apply_to_existing(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.unwrap().attributed, 1);

    let (_, tags) = engine.transaction_with_tags(tagged).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].id, tag.id);

    // Applying a second matching pattern does not duplicate the join row.
    let (_, outcome) = engine
        .create_tag_pattern(
            &actor,
            NewTagPatternCmd::new(tag.id, "GAS").apply_to_existing(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.unwrap().attributed, 0);

    let (_, tags) = engine.transaction_with_tags(tagged).await.unwrap();
    assert_eq!(tags.len(), 1);
}

#[tokio::test]
async fn non_admin_cannot_create_patterns() {
    let engine = engine_with_db().await;
    let owner = engine
        .new_owner(&admin(), NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();

    let err = engine
        .create_owner_pattern(
            &Actor::new("bob", false),
            NewOwnerPatternCmd::new(owner.id, "RENT"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
