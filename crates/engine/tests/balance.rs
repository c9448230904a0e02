use chrono::{TimeZone, Utc};
use engine::{
    Actor, Engine, ImportStatementCmd, MoneyCents, NewTransactionCmd, TransactionKind,
};
use migration::MigratorTrait;
use sea_orm::Database;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn admin() -> Actor {
    Actor::new("alice", true)
}

#[tokio::test]
async fn no_checkpoint_means_no_estimate() {
    let engine = engine_with_db().await;

    let estimate = engine.estimate_balance().await.unwrap();
    assert_eq!(estimate.checkpoint_balance, None);
    assert_eq!(estimate.checkpoint_date, None);
    assert_eq!(estimate.estimated_balance, None);
    assert_eq!(estimate.transactions_since, 0);
}

#[tokio::test]
async fn estimate_adds_money_in_and_subtracts_money_out() {
    let engine = engine_with_db().await;
    let actor = admin();

    let checkpoint_date = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    engine
        .set_balance_checkpoint(&actor, MoneyCents::new(100_000), checkpoint_date)
        .await
        .unwrap();

    engine
        .new_transaction(
            &actor,
            NewTransactionCmd::new(
                TransactionKind::MoneyIn,
                MoneyCents::new(30_000),
                Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap(),
                "deposit",
            ),
        )
        .await
        .unwrap();
    engine
        .new_transaction(
            &actor,
            NewTransactionCmd::new(
                TransactionKind::MoneyOut,
                MoneyCents::new(5_000),
                Utc.with_ymd_and_hms(2026, 3, 6, 0, 0, 0).unwrap(),
                "maintenance",
            ),
        )
        .await
        .unwrap();

    let estimate = engine.estimate_balance().await.unwrap();
    assert_eq!(estimate.checkpoint_balance, Some(MoneyCents::new(100_000)));
    assert_eq!(estimate.checkpoint_date, Some(checkpoint_date));
    // 1000.00 + 300.00 - 50.00
    assert_eq!(estimate.estimated_balance, Some(MoneyCents::new(125_000)));
    assert_eq!(estimate.transactions_since, 2);
}

#[tokio::test]
async fn transactions_before_the_checkpoint_are_excluded() {
    let engine = engine_with_db().await;
    let actor = admin();

    engine
        .new_transaction(
            &actor,
            NewTransactionCmd::new(
                TransactionKind::MoneyIn,
                MoneyCents::new(99_900),
                Utc.with_ymd_and_hms(2026, 2, 20, 0, 0, 0).unwrap(),
                "old deposit",
            ),
        )
        .await
        .unwrap();

    engine
        .set_balance_checkpoint(
            &actor,
            MoneyCents::new(50_000),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    let estimate = engine.estimate_balance().await.unwrap();
    assert_eq!(estimate.estimated_balance, Some(MoneyCents::new(50_000)));
    assert_eq!(estimate.transactions_since, 0);
}

#[tokio::test]
async fn duplicate_rows_do_not_move_the_estimate() {
    let engine = engine_with_db().await;
    let actor = admin();

    engine
        .set_balance_checkpoint(
            &actor,
            MoneyCents::new(100_000),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    let statement = "\
Fecha;Descripcion;Monto
05/03/2026;ABONO DEPOSITO;300.00
";
    engine
        .import_statement(&actor, ImportStatementCmd::new("uno.csv", statement))
        .await
        .unwrap();

    let first = engine.estimate_balance().await.unwrap();
    assert_eq!(first.estimated_balance, Some(MoneyCents::new(130_000)));
    assert_eq!(first.transactions_since, 1);

    // Re-importing adds only a duplicate-flagged row; the estimate and the
    // count must not change.
    engine
        .import_statement(&actor, ImportStatementCmd::new("uno.csv", statement))
        .await
        .unwrap();

    let second = engine.estimate_balance().await.unwrap();
    assert_eq!(second.estimated_balance, Some(MoneyCents::new(130_000)));
    assert_eq!(second.transactions_since, 1);
}

#[tokio::test]
async fn checkpoint_overwrites_in_place() {
    let engine = engine_with_db().await;
    let actor = admin();

    engine
        .set_balance_checkpoint(
            &actor,
            MoneyCents::new(10_000),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    engine
        .set_balance_checkpoint(
            &actor,
            MoneyCents::new(20_000),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    let (balance, date) = engine.balance_checkpoint().await.unwrap().unwrap();
    assert_eq!(balance, MoneyCents::new(20_000));
    assert_eq!(date, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
}

#[tokio::test]
async fn non_admin_cannot_set_checkpoint() {
    let engine = engine_with_db().await;

    let err = engine
        .set_balance_checkpoint(
            &Actor::new("bob", false),
            MoneyCents::new(10_000),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, engine::EngineError::Forbidden(_)));
}
