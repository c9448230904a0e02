use chrono::{TimeZone, Utc};
use engine::{
    Actor, Engine, EngineError, MeterReading, MoneyCents, NewOwnerCmd, NewRefillCmd,
    NewTransactionCmd, PaymentStatus, TransactionKind, UpdateTransactionCmd,
};
use migration::MigratorTrait;
use sea_orm::Database;
use uuid::Uuid;

const TOLERANCE: f64 = 1e-6;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn admin() -> Actor {
    Actor::new("alice", true)
}

async fn seed_owner(engine: &Engine, name: &str, apartment: &str) -> Uuid {
    engine
        .new_owner(&admin(), NewOwnerCmd::new(name, apartment))
        .await
        .unwrap()
        .id
}

fn reading(owner_id: Uuid, previous: f64, current: f64) -> MeterReading {
    MeterReading {
        owner_id,
        previous_reading: previous,
        current_reading: current,
    }
}

/// Records a money-in payment attributed to `owner_id` and carrying `tag_id`.
async fn seed_payment(engine: &Engine, owner_id: Uuid, tag_id: Uuid, cents: i64) {
    let actor = admin();
    let tx = engine
        .new_transaction(
            &actor,
            NewTransactionCmd::new(
                TransactionKind::MoneyIn,
                MoneyCents::new(cents),
                Utc.with_ymd_and_hms(2026, 4, 2, 0, 0, 0).unwrap(),
                "ABONO GAS",
            )
            .tag(tag_id),
        )
        .await
        .unwrap();
    engine
        .update_transaction(&actor, tx.id, UpdateTransactionCmd::new().owner_id(owner_id))
        .await
        .unwrap();
}

#[tokio::test]
async fn refill_entries_conserve_the_bill() {
    let engine = engine_with_db().await;
    let actor = admin();

    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;
    let b = seed_owner(&engine, "Juan Perez", "B-101").await;

    let (refill, entries) = engine
        .create_refill(
            &actor,
            NewRefillCmd::new(
                MoneyCents::new(100_000), // 1000.00
                150.0,
                Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
                vec![reading(a, 100.0, 130.0), reading(b, 200.0, 210.0)],
            )
            .efficiency_percent(5.0),
        )
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    let first = entries.iter().find(|e| e.owner_id == a).unwrap();
    assert!((first.consumption - 30.0).abs() < TOLERANCE);
    assert!((first.percentage - 75.0).abs() < TOLERANCE);
    assert!((first.subtotal - 750.0).abs() < TOLERANCE);
    assert!((first.total_amount - 787.5).abs() < TOLERANCE);

    let pct_sum: f64 = entries.iter().map(|e| e.percentage).sum();
    let subtotal_sum: f64 = entries.iter().map(|e| e.subtotal).sum();
    let total_sum: f64 = entries.iter().map(|e| e.total_amount).sum();
    assert!((pct_sum - 100.0).abs() < TOLERANCE);
    assert!((subtotal_sum - 1000.0).abs() < TOLERANCE);
    assert!((total_sum - 1050.0).abs() < TOLERANCE);

    // Round-trips through storage.
    let (stored, stored_entries) = engine.refill(refill.id).await.unwrap();
    assert_eq!(stored.bill_amount.cents(), 100_000);
    assert_eq!(stored_entries.len(), 2);
}

#[tokio::test]
async fn refill_with_no_consumption_is_rejected() {
    let engine = engine_with_db().await;
    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;

    let err = engine
        .create_refill(
            &admin(),
            NewRefillCmd::new(
                MoneyCents::new(50_000),
                100.0,
                Utc::now(),
                vec![reading(a, 120.0, 120.0)],
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    assert!(engine.list_refills().await.unwrap().is_empty());
}

#[tokio::test]
async fn pending_payments_match_tagged_money_in() {
    let engine = engine_with_db().await;
    let actor = admin();

    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;
    let b = seed_owner(&engine, "Juan Perez", "B-101").await;
    let tag = engine.new_tag(&actor, "lpg-april", None).await.unwrap();

    let (refill, _) = engine
        .create_refill(
            &actor,
            NewRefillCmd::new(
                MoneyCents::new(100_000),
                150.0,
                Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
                vec![reading(a, 100.0, 130.0), reading(b, 200.0, 210.0)],
            )
            .efficiency_percent(5.0)
            .tag_id(tag.id),
        )
        .await
        .unwrap();

    // A pays in full (787.50), B pays nothing.
    seed_payment(&engine, a, tag.id, 78_750).await;

    let payments = engine.pending_payments_for_refill(refill.id).await.unwrap();
    assert_eq!(payments.len(), 2);

    let pa = payments.iter().find(|p| p.owner_id == a).unwrap();
    assert!((pa.amount_paid - 787.5).abs() < TOLERANCE);
    assert!(pa.remaining.abs() < 0.005);
    assert_eq!(pa.status, PaymentStatus::Paid);

    let pb = payments.iter().find(|p| p.owner_id == b).unwrap();
    assert!((pb.amount_owed - 262.5).abs() < TOLERANCE);
    assert!((pb.amount_paid).abs() < TOLERANCE);
    assert_eq!(pb.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn partial_payment_stays_pending() {
    let engine = engine_with_db().await;
    let actor = admin();

    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;
    let tag = engine.new_tag(&actor, "lpg-april", None).await.unwrap();

    let (refill, _) = engine
        .create_refill(
            &actor,
            NewRefillCmd::new(
                MoneyCents::new(60_000),
                80.0,
                Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
                vec![reading(a, 0.0, 20.0)],
            )
            .tag_id(tag.id),
        )
        .await
        .unwrap();

    seed_payment(&engine, a, tag.id, 20_000).await;

    let payments = engine.pending_payments_for_refill(refill.id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert!((payments[0].remaining - 400.0).abs() < TOLERANCE);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
}

#[tokio::test]
async fn refill_without_tag_tracks_nothing_as_paid() {
    let engine = engine_with_db().await;
    let actor = admin();

    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;
    let (refill, _) = engine
        .create_refill(
            &actor,
            NewRefillCmd::new(
                MoneyCents::new(30_000),
                40.0,
                Utc::now(),
                vec![reading(a, 0.0, 10.0)],
            ),
        )
        .await
        .unwrap();

    let payments = engine.pending_payments_for_refill(refill.id).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert!((payments[0].amount_paid).abs() < TOLERANCE);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
}

#[tokio::test]
async fn summary_aggregates_across_refills() {
    let engine = engine_with_db().await;
    let actor = admin();

    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;
    let tag1 = engine.new_tag(&actor, "lpg-march", None).await.unwrap();
    let tag2 = engine.new_tag(&actor, "lpg-april", None).await.unwrap();

    engine
        .create_refill(
            &actor,
            NewRefillCmd::new(
                MoneyCents::new(40_000),
                50.0,
                Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
                vec![reading(a, 0.0, 10.0)],
            )
            .tag_id(tag1.id),
        )
        .await
        .unwrap();
    engine
        .create_refill(
            &actor,
            NewRefillCmd::new(
                MoneyCents::new(20_000),
                25.0,
                Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
                vec![reading(a, 10.0, 15.0)],
            )
            .tag_id(tag2.id),
        )
        .await
        .unwrap();

    seed_payment(&engine, a, tag1.id, 40_000).await;

    let summary = engine.pending_payments_summary().await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].owner_id, a);
    assert!((summary[0].total_owed - 600.0).abs() < TOLERANCE);
    assert!((summary[0].total_paid - 400.0).abs() < TOLERANCE);
    assert!((summary[0].remaining - 200.0).abs() < TOLERANCE);
}

#[tokio::test]
async fn deleting_a_refill_removes_its_entries() {
    let engine = engine_with_db().await;
    let actor = admin();

    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;
    let (refill, _) = engine
        .create_refill(
            &actor,
            NewRefillCmd::new(
                MoneyCents::new(30_000),
                40.0,
                Utc::now(),
                vec![reading(a, 0.0, 10.0)],
            ),
        )
        .await
        .unwrap();

    engine.delete_refill(&actor, refill.id).await.unwrap();
    assert!(engine.list_refills().await.unwrap().is_empty());
    let err = engine.refill(refill.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn non_admin_cannot_create_refills() {
    let engine = engine_with_db().await;
    let a = seed_owner(&engine, "Maria Lopez", "A-302").await;

    let err = engine
        .create_refill(
            &Actor::new("bob", false),
            NewRefillCmd::new(
                MoneyCents::new(30_000),
                40.0,
                Utc::now(),
                vec![reading(a, 0.0, 10.0)],
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
