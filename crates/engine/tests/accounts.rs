use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Account, AccountFilter, AccountKind, AccountPatch, Category, Currency, DateRange, Engine,
    EngineError, Money, MovementKind, NewAccount, NewMovement, NewSavingsGoal, SystemCategory,
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

async fn open_account(engine: &Engine, name: &str, kind: AccountKind, balance: i64) -> Account {
    engine
        .create_account(
            NewAccount::new(name, kind, Currency::Eur).opening_balance(balance, date(2025, 1, 1)),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn opening_balance_is_recorded_as_a_movement() {
    let (engine, _db) = engine_with_db().await;
    let account = open_account(&engine, "Bank", AccountKind::Bank, 100_000).await;
    assert_eq!(account.balance_minor, 100_000);

    let movements = engine
        .movements(account.id, DateRange::default())
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount_minor, 100_000);
    assert_eq!(movements[0].kind, MovementKind::Income);
    assert_eq!(
        movements[0].category,
        Category::System(SystemCategory::OpeningBalance)
    );

    assert_eq!(
        engine.recompute_balance(account.id).await.unwrap(),
        Money::new(100_000)
    );
}

#[tokio::test]
async fn negative_opening_balance_is_an_expense() {
    let (engine, _db) = engine_with_db().await;
    let card = open_account(&engine, "Card", AccountKind::Card, -2_500).await;
    assert_eq!(card.balance_minor, -2_500);

    let movements = engine.movements(card.id, DateRange::default()).await.unwrap();
    assert_eq!(movements[0].kind, MovementKind::Expense);
    assert_eq!(movements[0].amount_minor, -2_500);
}

#[tokio::test]
async fn blank_account_name_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_account(NewAccount::new("   ", AccountKind::Cash, Currency::Eur))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ValidationFailed("account name must not be empty".to_string())
    );
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let err = engine.account(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn list_filters_by_kind_and_active_flag() {
    let (engine, _db) = engine_with_db().await;
    let cash = open_account(&engine, "Cash", AccountKind::Cash, 0).await;
    open_account(&engine, "Bank", AccountKind::Bank, 0).await;
    open_account(&engine, "Pot", AccountKind::Savings, 0).await;

    engine
        .update_account(cash.id, AccountPatch::default().active(false))
        .await
        .unwrap();

    let all = engine.list_accounts(AccountFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let active = engine
        .list_accounts(AccountFilter {
            kind: None,
            active_only: true,
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|a| a.id != cash.id));

    let savings = engine
        .list_accounts(AccountFilter {
            kind: Some(AccountKind::Savings),
            active_only: false,
        })
        .await
        .unwrap();
    assert_eq!(savings.len(), 1);
    assert_eq!(savings[0].name, "Pot");
}

#[tokio::test]
async fn update_keeps_balance_and_guards_currency() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 5_000).await;

    let renamed = engine
        .update_account(bank.id, AccountPatch::default().name("  Main bank "))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Main bank");
    assert_eq!(renamed.balance_minor, 5_000);

    let err = engine
        .update_account(bank.id, AccountPatch::default().currency(Currency::Usd))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));

    let empty = open_account(&engine, "Spare", AccountKind::Other, 0).await;
    let switched = engine
        .update_account(empty.id, AccountPatch::default().currency(Currency::Usd))
        .await
        .unwrap();
    assert_eq!(switched.currency, Currency::Usd);
}

#[tokio::test]
async fn delete_refuses_referenced_accounts_unless_cascading() {
    let (engine, _db) = engine_with_db().await;
    let pot = open_account(&engine, "Pot", AccountKind::Savings, 1_000).await;
    let goal = engine
        .create_savings_goal(NewSavingsGoal::new("Bike", 50_000).savings_account(pot.id))
        .await
        .unwrap();

    let err = engine.delete_account(pot.id, false).await.unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));

    engine.delete_account(pot.id, true).await.unwrap();
    assert!(matches!(
        engine.account(pot.id).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
    let goal = engine.savings_goal(goal.id).await.unwrap();
    assert_eq!(goal.savings_account_id, None);
}

#[tokio::test]
async fn set_balance_then_recompute_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 100_000).await;

    engine.set_balance(bank.id, 123).await.unwrap();
    assert_eq!(
        engine.balance_drift(bank.id).await.unwrap(),
        Money::new(123 - 100_000)
    );

    let first = engine.recompute_balance(bank.id).await.unwrap();
    let second = engine.recompute_balance(bank.id).await.unwrap();
    assert_eq!(first, Money::new(100_000));
    assert_eq!(first, second);
    assert_eq!(engine.balance_drift(bank.id).await.unwrap(), Money::ZERO);
    assert_eq!(engine.account(bank.id).await.unwrap().balance_minor, 100_000);
}

#[tokio::test]
async fn recompute_all_reports_only_drifted_accounts() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 10_000).await;
    open_account(&engine, "Cash", AccountKind::Cash, 2_000).await;
    engine.set_balance(bank.id, 0).await.unwrap();

    let report = engine.recompute_all().await.unwrap();
    assert_eq!(report.accounts_checked, 2);
    assert_eq!(report.corrections.len(), 1);
    assert_eq!(report.corrections[0].account_id, bank.id);
    assert_eq!(report.corrections[0].drift_minor(), -10_000);

    assert!(engine.recompute_all().await.unwrap().is_clean());
}

#[tokio::test]
async fn append_and_delete_never_touch_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 1_000).await;

    let entry = engine
        .append_movement(NewMovement::new(
            bank.id,
            MovementKind::Expense,
            400,
            Category::parse("groceries"),
            date(2025, 3, 2),
        ))
        .await
        .unwrap();
    assert_eq!(entry.amount_minor, -400);
    assert_eq!(engine.account(bank.id).await.unwrap().balance_minor, 1_000);
    assert_eq!(engine.movement(entry.id).await.unwrap(), entry);

    engine.delete_movement(entry.id).await.unwrap();
    assert_eq!(engine.account(bank.id).await.unwrap().balance_minor, 1_000);
    assert!(matches!(
        engine.movement(entry.id).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}

#[tokio::test]
async fn recorded_movements_move_the_balance_and_void_reverts_them() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 1_000).await;

    let salary = engine
        .record_movement(
            NewMovement::new(
                bank.id,
                MovementKind::Income,
                250_000,
                Category::parse("salary"),
                date(2025, 3, 1),
            )
            .description("March"),
        )
        .await
        .unwrap();
    assert_eq!(engine.account(bank.id).await.unwrap().balance_minor, 251_000);

    engine.void_movement(salary.id).await.unwrap();
    assert_eq!(engine.account(bank.id).await.unwrap().balance_minor, 1_000);
    assert_eq!(
        engine.balance_drift(bank.id).await.unwrap(),
        Money::ZERO
    );
}

#[tokio::test]
async fn system_categories_are_reserved_for_engine_flows() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 1_000).await;

    let err = engine
        .record_movement(NewMovement::new(
            bank.id,
            MovementKind::Income,
            100,
            Category::parse("Transfer"),
            date(2025, 3, 1),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));

    let opening = engine.movements(bank.id, DateRange::default()).await.unwrap();
    let err = engine.void_movement(opening[0].id).await.unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));
}

#[tokio::test]
async fn inactive_accounts_cannot_record_movements() {
    let (engine, _db) = engine_with_db().await;
    let cash = open_account(&engine, "Cash", AccountKind::Cash, 1_000).await;
    engine
        .update_account(cash.id, AccountPatch::default().active(false))
        .await
        .unwrap();

    let err = engine
        .record_movement(NewMovement::new(
            cash.id,
            MovementKind::Expense,
            100,
            Category::parse("coffee"),
            date(2025, 3, 1),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InactiveAccount("Cash".to_string()));
}

#[tokio::test]
async fn movements_respect_inclusive_date_bounds_and_order() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 0).await;
    for (day, amount) in [(15, 300), (1, 100), (31, 200)] {
        engine
            .append_movement(NewMovement::new(
                bank.id,
                MovementKind::Income,
                amount,
                Category::parse("misc"),
                date(2025, 3, day),
            ))
            .await
            .unwrap();
    }

    let all = engine
        .movements(bank.id, DateRange::default())
        .await
        .unwrap();
    let days: Vec<_> = all.iter().map(|m| m.date).collect();
    assert_eq!(
        days,
        vec![date(2025, 3, 1), date(2025, 3, 15), date(2025, 3, 31)]
    );

    let window = engine
        .movements(
            bank.id,
            DateRange::between(date(2025, 3, 1), date(2025, 3, 15)),
        )
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
}

#[tokio::test]
async fn engines_only_see_their_own_accounts() {
    let (engine, db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", AccountKind::Bank, 1_000).await;

    let other = Engine::builder()
        .database(db.clone())
        .owner("someone-else")
        .build()
        .await
        .unwrap();
    assert!(matches!(
        other.account(bank.id).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
    assert!(
        other
            .list_accounts(AccountFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}
