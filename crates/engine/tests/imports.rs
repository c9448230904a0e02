use engine::{
    Actor, Engine, EngineError, ImportStatementCmd, NewOwnerCmd, NewOwnerPatternCmd,
    StatementError, TransactionListFilter, UpdateTransactionCmd,
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

const STATEMENT: &str = "\
Estado de Cuenta
Cuenta: 001-222333-4

Fecha;Descripcion;Monto;Referencia;Documento
05/03/2026;ABONO DEPOSITO RENT APT 302;1,200.00;R-1;90001
07/03/2026;DEBITO CHEQUE MANTENIMIENTO;450.00;R-2;90002
08/03/2026;SALDO DISPONIBLE;5,000.00;;
09/03/2026;PAGO DE IMPUESTO TIMBRE;35.25;;90003
";

#[tokio::test]
async fn first_import_creates_all_rows_as_new() {
    let engine = engine_with_db().await;

    let outcome = engine
        .import_statement(&admin(), ImportStatementCmd::new("marzo.csv", STATEMENT))
        .await
        .unwrap();

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.new_count, 3);
    assert_eq!(outcome.duplicate_count, 0);
    assert_eq!(outcome.account.as_deref(), Some("001-222333-4"));

    let batch = engine.batch(outcome.batch_id).await.unwrap();
    assert!(batch.is_consistent());

    let txs = engine
        .list_transactions(10, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 3);
    assert!(txs.iter().all(|t| !t.is_duplicate));
}

#[tokio::test]
async fn reimporting_the_same_file_flags_everything_duplicate() {
    let engine = engine_with_db().await;

    engine
        .import_statement(&admin(), ImportStatementCmd::new("marzo.csv", STATEMENT))
        .await
        .unwrap();
    let second = engine
        .import_statement(&admin(), ImportStatementCmd::new("marzo.csv", STATEMENT))
        .await
        .unwrap();

    assert_eq!(second.total, 3);
    assert_eq!(second.new_count, 0);
    assert_eq!(second.duplicate_count, 3);

    // Duplicates are retained, not discarded.
    let txs = engine
        .list_transactions(20, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 6);
    assert_eq!(txs.iter().filter(|t| t.is_duplicate).count(), 3);
}

#[tokio::test]
async fn reimport_carries_forward_staff_edits() {
    let engine = engine_with_db().await;
    let actor = admin();

    engine
        .import_statement(&actor, ImportStatementCmd::new("marzo.csv", STATEMENT))
        .await
        .unwrap();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();

    let txs = engine
        .list_transactions(10, &TransactionListFilter::default())
        .await
        .unwrap();
    let edited = txs
        .iter()
        .find(|t| t.serial.as_deref() == Some("90001"))
        .unwrap();
    engine
        .update_transaction(
            &actor,
            edited.id,
            UpdateTransactionCmd::new()
                .description("Rent March A-302")
                .owner_id(owner.id),
        )
        .await
        .unwrap();

    engine
        .import_statement(&actor, ImportStatementCmd::new("marzo.csv", STATEMENT))
        .await
        .unwrap();

    let txs = engine
        .list_transactions(20, &TransactionListFilter::default())
        .await
        .unwrap();
    let duplicate = txs
        .iter()
        .find(|t| t.is_duplicate && t.serial.as_deref() == Some("90001"))
        .unwrap();

    // The duplicate carries the edited description and owner, not the
    // freshly parsed bank text.
    assert_eq!(duplicate.description, "Rent March A-302");
    assert_eq!(duplicate.owner_id, Some(owner.id));
    assert_eq!(
        duplicate.bank_description.as_deref(),
        Some("ABONO DEPOSITO RENT APT 302")
    );
}

#[tokio::test]
async fn import_attributes_owners_via_patterns() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    engine
        .create_owner_pattern(&actor, NewOwnerPatternCmd::new(owner.id, "RENT APT 302"))
        .await
        .unwrap();

    engine
        .import_statement(&actor, ImportStatementCmd::new("marzo.csv", STATEMENT))
        .await
        .unwrap();

    let txs = engine
        .list_transactions(10, &TransactionListFilter::default())
        .await
        .unwrap();
    let rent = txs
        .iter()
        .find(|t| t.serial.as_deref() == Some("90001"))
        .unwrap();
    assert_eq!(rent.owner_id, Some(owner.id));

    let other = txs
        .iter()
        .find(|t| t.serial.as_deref() == Some("90002"))
        .unwrap();
    assert_eq!(other.owner_id, None);
}

#[tokio::test]
async fn import_without_pattern_matching_leaves_owners_unset() {
    let engine = engine_with_db().await;
    let actor = admin();

    let owner = engine
        .new_owner(&actor, NewOwnerCmd::new("Maria Lopez", "A-302"))
        .await
        .unwrap();
    engine
        .create_owner_pattern(&actor, NewOwnerPatternCmd::new(owner.id, "RENT"))
        .await
        .unwrap();

    engine
        .import_statement(
            &actor,
            ImportStatementCmd::new("marzo.csv", STATEMENT).use_pattern_matching(false),
        )
        .await
        .unwrap();

    let txs = engine
        .list_transactions(10, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(txs.iter().all(|t| t.owner_id.is_none()));
}

#[tokio::test]
async fn unparseable_file_leaves_no_batch_behind() {
    let engine = engine_with_db().await;

    let err = engine
        .import_statement(
            &admin(),
            ImportStatementCmd::new("garbage.csv", "not a statement\nat all\n"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Statement(StatementError::UnrecognizedFormat(_))
    ));

    assert!(engine.list_batches().await.unwrap().is_empty());
}

#[tokio::test]
async fn header_without_rows_is_a_distinct_error() {
    let engine = engine_with_db().await;

    let err = engine
        .import_statement(
            &admin(),
            ImportStatementCmd::new("empty.csv", "Fecha;Descripcion;Monto\n"),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Statement(StatementError::NoTransactions)
    );
    assert!(engine.list_batches().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_admin_cannot_import() {
    let engine = engine_with_db().await;

    let err = engine
        .import_statement(
            &Actor::new("bob", false),
            ImportStatementCmd::new("marzo.csv", STATEMENT),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert!(engine.list_batches().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_batch_removes_its_transactions() {
    let engine = engine_with_db().await;
    let actor = admin();

    let outcome = engine
        .import_statement(&actor, ImportStatementCmd::new("marzo.csv", STATEMENT))
        .await
        .unwrap();

    engine.delete_batch(&actor, outcome.batch_id).await.unwrap();

    assert!(engine.list_batches().await.unwrap().is_empty());
    let txs = engine
        .list_transactions(10, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(txs.is_empty());
}
