use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Account, AccountKind, AccountPatch, Category, Currency, DateRange, Engine, EngineError,
    MovementKind, NewAccount, SystemCategory, TransferCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn open_account(engine: &Engine, name: &str, currency: Currency, balance: i64) -> Account {
    engine
        .create_account(
            NewAccount::new(name, AccountKind::Bank, currency)
                .opening_balance(balance, date(2025, 1, 1)),
        )
        .await
        .unwrap()
}

async fn balance(engine: &Engine, account: &Account) -> i64 {
    engine.account(account.id).await.unwrap().balance_minor
}

async fn movement_count(engine: &Engine, account: &Account) -> usize {
    engine
        .movements(account.id, DateRange::default())
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn transfer_moves_money_and_writes_two_entries() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 100_000).await;
    let b = open_account(&engine, "B", Currency::Eur, 20_000).await;

    let receipt = engine
        .execute_transfer(
            TransferCmd::new(a.id, b.id, 30_000, date(2025, 3, 5)).description("rent share"),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, &a).await, 70_000);
    assert_eq!(balance(&engine, &b).await, 50_000);

    let expense = engine.movement(receipt.expense_id).await.unwrap();
    let income = engine.movement(receipt.income_id).await.unwrap();
    assert_eq!(expense.account_id, a.id);
    assert_eq!(expense.kind, MovementKind::Expense);
    assert_eq!(expense.amount_minor, -30_000);
    assert_eq!(income.account_id, b.id);
    assert_eq!(income.kind, MovementKind::Income);
    assert_eq!(income.amount_minor, 30_000);
    for entry in [&expense, &income] {
        assert_eq!(entry.date, date(2025, 3, 5));
        assert_eq!(entry.category, Category::System(SystemCategory::Transfer));
        assert_eq!(entry.description.as_deref(), Some("rent share"));
        assert!(!entry.category.counts_in_aggregates());
    }

    // opening balance + transfer leg on each side
    assert_eq!(movement_count(&engine, &a).await, 2);
    assert_eq!(movement_count(&engine, &b).await, 2);
    assert!(engine.recompute_all().await.unwrap().is_clean());
}

#[tokio::test]
async fn transfer_can_carry_another_system_tag() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 1_000).await;
    let b = open_account(&engine, "B", Currency::Eur, 0).await;

    let receipt = engine
        .execute_transfer(
            TransferCmd::new(a.id, b.id, 500, date(2025, 3, 5))
                .category(SystemCategory::Savings),
        )
        .await
        .unwrap();
    let income = engine.movement(receipt.income_id).await.unwrap();
    assert_eq!(income.category, Category::System(SystemCategory::Savings));
}

#[tokio::test]
async fn non_positive_amount_leaves_everything_untouched() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 100_000).await;
    let b = open_account(&engine, "B", Currency::Eur, 20_000).await;

    for amount in [0, -5] {
        let err = engine
            .execute_transfer(TransferCmd::new(a.id, b.id, amount, date(2025, 3, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    assert_eq!(balance(&engine, &a).await, 100_000);
    assert_eq!(balance(&engine, &b).await, 20_000);
    assert_eq!(movement_count(&engine, &a).await, 1);
    assert_eq!(movement_count(&engine, &b).await, 1);
}

#[tokio::test]
async fn insufficient_funds_leaves_everything_untouched() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 100_000).await;
    let b = open_account(&engine, "B", Currency::Eur, 20_000).await;

    let err = engine
        .execute_transfer(TransferCmd::new(a.id, b.id, 100_001, date(2025, 3, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    assert_eq!(balance(&engine, &a).await, 100_000);
    assert_eq!(balance(&engine, &b).await, 20_000);
    assert_eq!(movement_count(&engine, &a).await, 1);
    assert_eq!(movement_count(&engine, &b).await, 1);
}

#[tokio::test]
async fn exact_balance_can_be_transferred() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 7_500).await;
    let b = open_account(&engine, "B", Currency::Eur, 0).await;

    engine
        .execute_transfer(TransferCmd::new(a.id, b.id, 7_500, date(2025, 3, 5)))
        .await
        .unwrap();
    assert_eq!(balance(&engine, &a).await, 0);
    assert_eq!(balance(&engine, &b).await, 7_500);
}

#[tokio::test]
async fn missing_account_is_reported_first() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 1_000).await;

    let err = engine
        .execute_transfer(TransferCmd::new(a.id, Uuid::new_v4(), 0, date(2025, 3, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn inactive_account_is_checked_before_the_amount() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 1_000).await;
    let b = open_account(&engine, "B", Currency::Eur, 0).await;
    engine
        .update_account(b.id, AccountPatch::default().active(false))
        .await
        .unwrap();

    let err = engine
        .execute_transfer(TransferCmd::new(a.id, b.id, 0, date(2025, 3, 5)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InactiveAccount("B".to_string()));
}

#[tokio::test]
async fn same_account_transfer_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let a = open_account(&engine, "A", Currency::Eur, 1_000).await;

    let err = engine
        .execute_transfer(TransferCmd::new(a.id, a.id, 100, date(2025, 3, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));
}

#[tokio::test]
async fn unknown_account_on_both_sides_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let ghost = Uuid::new_v4();

    let err = engine
        .execute_transfer(TransferCmd::new(ghost, ghost, 100, date(2025, 3, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn cross_currency_transfer_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let eur = open_account(&engine, "Euro", Currency::Eur, 1_000).await;
    let usd = open_account(&engine, "Dollar", Currency::Usd, 0).await;

    let err = engine
        .execute_transfer(TransferCmd::new(eur.id, usd.id, 100, date(2025, 3, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
    assert_eq!(balance(&engine, &eur).await, 1_000);
}
