use chrono::{TimeZone, Utc};
use engine::{
    Actor, Engine, EngineError, MoneyCents, NewOwnerCmd, NewTransactionCmd, TransactionKind,
    TransactionListFilter, UpdateTransactionCmd,
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

async fn seed_transaction(engine: &Engine, day: u32, description: &str) -> Uuid {
    let tx = engine
        .new_transaction(
            &admin(),
            NewTransactionCmd::new(
                TransactionKind::MoneyIn,
                MoneyCents::new(5_000),
                Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap(),
                description,
            ),
        )
        .await
        .unwrap();
    tx.id
}

#[tokio::test]
async fn manual_entry_requires_admin() {
    let engine = engine_with_db().await;

    let err = engine
        .new_transaction(
            &Actor::new("bob", false),
            NewTransactionCmd::new(
                TransactionKind::MoneyIn,
                MoneyCents::new(100),
                Utc::now(),
                "cash deposit",
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn staff_edits_update_description_owner_and_category() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    let tx_id = seed_transaction(&engine, 5, "ABONO DEPOSITO").await;

    let updated = engine
        .update_transaction(
            &actor,
            tx_id,
            UpdateTransactionCmd::new()
                .description("March rent")
                .owner_id(owner.id)
                .category("rent"),
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "March rent");
    assert_eq!(updated.owner_id, Some(owner.id));
    assert_eq!(updated.category.as_deref(), Some("rent"));

    let cleared = engine
        .update_transaction(&actor, tx_id, UpdateTransactionCmd::new().clear_owner())
        .await
        .unwrap();
    assert_eq!(cleared.owner_id, None);
    assert_eq!(cleared.description, "March rent");
}

#[tokio::test]
async fn filtering_by_parent_tag_includes_direct_children_only() {
    let engine = engine_with_db().await;
    let actor = admin();

    let utilities = engine.new_tag(&actor, "utilities", None).await.unwrap();
    let lpg = engine
        .new_tag(&actor, "lpg", Some(utilities.id))
        .await
        .unwrap();
    let march = engine.new_tag(&actor, "lpg-march", Some(lpg.id)).await.unwrap();
    let rent = engine.new_tag(&actor, "rent", None).await.unwrap();

    let direct = seed_transaction(&engine, 3, "utilities bill").await;
    let child = seed_transaction(&engine, 4, "lpg refill payment").await;
    let grandchild = seed_transaction(&engine, 5, "lpg march payment").await;
    let unrelated = seed_transaction(&engine, 6, "rent payment").await;

    engine.assign_tag(&actor, direct, utilities.id).await.unwrap();
    engine.assign_tag(&actor, child, lpg.id).await.unwrap();
    engine.assign_tag(&actor, grandchild, march.id).await.unwrap();
    engine.assign_tag(&actor, unrelated, rent.id).await.unwrap();

    let filter = TransactionListFilter {
        tag_id: Some(utilities.id),
        ..Default::default()
    };
    let txs = engine.list_transactions(10, &filter).await.unwrap();
    let ids: Vec<Uuid> = txs.iter().map(|t| t.id).collect();

    // One-hop expansion: the tag itself plus direct children, no deeper.
    assert!(ids.contains(&direct));
    assert!(ids.contains(&child));
    assert!(!ids.contains(&grandchild));
    assert!(!ids.contains(&unrelated));
}

#[tokio::test]
async fn tag_cycles_are_rejected() {
    let engine = engine_with_db().await;
    let actor = admin();

    let parent = engine.new_tag(&actor, "parent", None).await.unwrap();
    let child = engine
        .new_tag(&actor, "child", Some(parent.id))
        .await
        .unwrap();

    let err = engine
        .set_tag_parent(&actor, parent.id, Some(child.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .set_tag_parent(&actor, parent.id, Some(parent.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    // A legal re-parent still works.
    engine
        .set_tag_parent(&actor, child.id, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn pagination_walks_newest_to_oldest() {
    let engine = engine_with_db().await;

    for day in 1..=5 {
        seed_transaction(&engine, day, &format!("entry {day}")).await;
    }

    let filter = TransactionListFilter::default();
    let (page1, cursor) = engine
        .list_transactions_page(2, None, &filter)
        .await
        .unwrap();
    assert_eq!(page1.len(), 2);
    assert_eq!(page1[0].description, "entry 5");
    assert_eq!(page1[1].description, "entry 4");
    let cursor = cursor.unwrap();

    let (page2, cursor) = engine
        .list_transactions_page(2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(page2.len(), 2);
    assert_eq!(page2[0].description, "entry 3");
    let cursor = cursor.unwrap();

    let (page3, cursor) = engine
        .list_transactions_page(2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(page3.len(), 1);
    assert_eq!(page3[0].description, "entry 1");
    assert!(cursor.is_none());
}

#[tokio::test]
async fn list_filters_by_owner_kind_and_range() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    let mine = seed_transaction(&engine, 10, "owned entry").await;
    seed_transaction(&engine, 11, "someone else").await;
    engine
        .update_transaction(&actor, mine, UpdateTransactionCmd::new().owner_id(owner.id))
        .await
        .unwrap();

    let filter = TransactionListFilter {
        owner_id: Some(owner.id),
        ..Default::default()
    };
    let txs = engine.list_transactions(10, &filter).await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].id, mine);

    let filter = TransactionListFilter {
        kind: Some(TransactionKind::MoneyOut),
        ..Default::default()
    };
    assert!(engine.list_transactions(10, &filter).await.unwrap().is_empty());

    let filter = TransactionListFilter {
        from: Some(Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap()),
        to: Some(Utc.with_ymd_and_hms(2026, 3, 12, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    let txs = engine.list_transactions(10, &filter).await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].description, "someone else");
}

#[tokio::test]
async fn invalid_range_is_rejected() {
    let engine = engine_with_db().await;

    let filter = TransactionListFilter {
        from: Some(Utc.with_ymd_and_hms(2026, 3, 12, 0, 0, 0).unwrap()),
        to: Some(Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap()),
        ..Default::default()
    };
    let err = engine.list_transactions(10, &filter).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn duplicate_apartment_is_rejected() {
    let engine = engine_with_db().await;
    let actor = admin();

    engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    let err = engine
        .new_owner(&actor, NewOwnerCmd::new("Juan Perez", "A-302"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn deleting_an_owner_detaches_transactions_and_drops_patterns() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    engine
        .create_owner_pattern(&actor, engine::NewOwnerPatternCmd::new(owner.id, "RENT"))
        .await
        .unwrap();
    let tx_id = seed_transaction(&engine, 7, "ABONO RENT").await;
    engine
        .update_transaction(&actor, tx_id, UpdateTransactionCmd::new().owner_id(owner.id))
        .await
        .unwrap();

    engine.delete_owner(&actor, owner.id).await.unwrap();

    let (tx, _) = engine.transaction_with_tags(tx_id).await.unwrap();
    assert_eq!(tx.owner_id, None);
    let err = engine.owner(owner.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
