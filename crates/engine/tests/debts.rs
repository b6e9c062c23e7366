use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Account, AccountKind, AccountResolutionStrategy, AutoPayOutcome, Category, Currency,
    DateRange, Debt, DebtKind, DebtPatch, DebtPaymentCmd, DebtStatus, Engine, EngineError,
    NewAccount, NewDebt, PaymentRejection, SystemCategory,
};
use migration::MigratorTrait;

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

fn today() -> NaiveDate {
    date(2025, 3, 10)
}

async fn open_account(engine: &Engine, name: &str, balance: i64) -> Account {
    engine
        .create_account(
            NewAccount::new(name, AccountKind::Bank, Currency::Eur)
                .opening_balance(balance, date(2025, 1, 1)),
        )
        .await
        .unwrap()
}

async fn car_loan(engine: &Engine, due: NaiveDate) -> Debt {
    engine
        .create_debt(
            NewDebt::new("Car loan", "Bank", 120_000, date(2025, 1, 1), due)
                .interest_rate_bp(1200)
                .monthly_payment(15_000),
            today(),
        )
        .await
        .unwrap()
}

async fn balance(engine: &Engine, account: &Account) -> i64 {
    engine.account(account.id).await.unwrap().balance_minor
}

#[tokio::test]
async fn payment_splits_interest_and_principal() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 100_000).await;
    let debt = car_loan(&engine, date(2025, 3, 20)).await;
    assert_eq!(debt.status, DebtStatus::Active);
    assert_eq!(debt.due_month, "2025-03");

    let payment = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 15_000, today()).from_account(bank.id))
        .await
        .unwrap();
    assert_eq!(payment.interest_minor, 1_200);
    assert_eq!(payment.principal_minor, 13_800);
    assert_eq!(payment.remaining_balance_minor, 106_200);
    assert_eq!(payment.payment_month, "2025-03");
    assert_eq!(payment.from_account_id, bank.id);

    let debt = engine.debt(debt.id).await.unwrap();
    assert_eq!(debt.current_amount_minor, 106_200);
    assert_eq!(debt.status, DebtStatus::Active);
    assert_eq!(balance(&engine, &bank).await, 85_000);

    // a single debit leg, no credit side
    let entry = engine.movement(payment.movement_id).await.unwrap();
    assert_eq!(entry.amount_minor, -15_000);
    assert_eq!(entry.category, Category::System(SystemCategory::DebtPayment));
    let movements = engine
        .movements(bank.id, DateRange::default())
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert!(engine.recompute_all().await.unwrap().is_clean());
}

#[tokio::test]
async fn payments_outside_the_due_month_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 100_000).await;

    let future = car_loan(&engine, date(2025, 4, 5)).await;
    assert_eq!(future.status, DebtStatus::Future);
    let err = engine
        .add_payment(DebtPaymentCmd::new(future.id, 1_000, today()).from_account(bank.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::IneligiblePayment(PaymentRejection::WindowNotOpen)
    );

    let overdue = car_loan(&engine, date(2025, 2, 20)).await;
    assert_eq!(overdue.status, DebtStatus::Overdue);
    let err = engine
        .add_payment(DebtPaymentCmd::new(overdue.id, 1_000, today()).from_account(bank.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::IneligiblePayment(PaymentRejection::WindowExpired)
    );

    assert_eq!(balance(&engine, &bank).await, 100_000);
    assert!(engine.debt_payments(future.id).await.unwrap().is_empty());
    assert_eq!(
        engine
            .debt_eligibility(overdue.id, date(2025, 2, 1))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn settling_a_debt_marks_it_paid_for_good() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 200_000).await;
    let debt = car_loan(&engine, date(2025, 3, 20)).await;

    // overpaying floors the balance at zero
    let payment = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 150_000, today()).from_account(bank.id))
        .await
        .unwrap();
    assert_eq!(payment.remaining_balance_minor, 0);
    let debt = engine.debt(debt.id).await.unwrap();
    assert_eq!(debt.current_amount_minor, 0);
    assert_eq!(debt.status, DebtStatus::Paid);

    let err = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 100, today()).from_account(bank.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::IneligiblePayment(PaymentRejection::AlreadySettled)
    );

    let changed = engine
        .refresh_debt_statuses(date(2025, 6, 1))
        .await
        .unwrap();
    assert!(changed.is_empty());
    assert_eq!(
        engine.debt(debt.id).await.unwrap().status,
        DebtStatus::Paid
    );
}

#[tokio::test]
async fn manual_edit_can_reopen_a_paid_debt() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 200_000).await;
    let debt = car_loan(&engine, date(2025, 3, 20)).await;
    engine
        .add_payment(DebtPaymentCmd::new(debt.id, 150_000, today()).from_account(bank.id))
        .await
        .unwrap();

    let reopened = engine
        .update_debt(debt.id, DebtPatch::default().current_amount(5_000), today())
        .await
        .unwrap();
    assert_eq!(reopened.status, DebtStatus::Active);
    assert_eq!(
        engine.debt(debt.id).await.unwrap().current_amount_minor,
        5_000
    );
}

#[tokio::test]
async fn source_falls_back_to_payment_account_then_strategy() {
    let (engine, _db) = engine_with_db().await;
    let poor = open_account(&engine, "Poor", 100).await;
    let rich = open_account(&engine, "Rich", 100_000).await;
    let designated = open_account(&engine, "Designated", 50_000).await;

    let debt = car_loan(&engine, date(2025, 3, 20)).await;
    let payment = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 5_000, today()))
        .await
        .unwrap();
    assert_eq!(payment.from_account_id, rich.id);
    assert_eq!(balance(&engine, &poor).await, 100);

    engine
        .update_debt(
            debt.id,
            DebtPatch::default().payment_account(Some(designated.id)),
            today(),
        )
        .await
        .unwrap();
    let payment = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 5_000, today()))
        .await
        .unwrap();
    assert_eq!(payment.from_account_id, designated.id);
    assert_eq!(balance(&engine, &designated).await, 45_000);
}

#[tokio::test]
async fn no_funding_account_fails_without_side_effects() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 1_000).await;
    let debt = car_loan(&engine, date(2025, 3, 20)).await;

    let err = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 5_000, today()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let err = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 5_000, today()).from_account(bank.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    assert_eq!(
        engine.debt(debt.id).await.unwrap().current_amount_minor,
        120_000
    );
    assert_eq!(balance(&engine, &bank).await, 1_000);
}

#[derive(Debug)]
struct LastFit;

impl AccountResolutionStrategy for LastFit {
    fn funding_source<'a>(
        &self,
        candidates: &'a [Account],
        amount_minor: i64,
    ) -> Option<&'a Account> {
        candidates.iter().rev().find(|a| a.can_cover(amount_minor))
    }

    fn savings_account<'a>(&self, candidates: &'a [Account]) -> Option<&'a Account> {
        candidates
            .iter()
            .rev()
            .find(|a| a.kind == AccountKind::Savings)
    }
}

#[tokio::test]
async fn resolution_strategy_is_pluggable() {
    let (_engine, db) = engine_with_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .resolution(LastFit)
        .build()
        .await
        .unwrap();
    open_account(&engine, "First", 50_000).await;
    let second = open_account(&engine, "Second", 50_000).await;
    let debt = car_loan(&engine, date(2025, 3, 20)).await;

    let payment = engine
        .add_payment(DebtPaymentCmd::new(debt.id, 5_000, today()))
        .await
        .unwrap();
    assert_eq!(payment.from_account_id, second.id);
}

#[tokio::test]
async fn recurring_debt_rolls_into_next_month() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 100_000).await;
    let debt = engine
        .create_debt(
            NewDebt::new("Phone", "Telco", 60_000, date(2025, 1, 1), date(2025, 3, 31))
                .kind(DebtKind::Recurring)
                .monthly_payment(5_000),
            today(),
        )
        .await
        .unwrap();

    engine
        .add_payment(DebtPaymentCmd::new(debt.id, 5_000, today()).from_account(bank.id))
        .await
        .unwrap();
    let debt = engine.debt(debt.id).await.unwrap();
    assert_eq!(debt.due_date, date(2025, 4, 30));
    assert_eq!(debt.due_month, "2025-04");
    assert_eq!(debt.status, DebtStatus::Future);
    assert_eq!(debt.current_amount_minor, 55_000);

    let changed = engine
        .refresh_debt_statuses(date(2025, 4, 2))
        .await
        .unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].status, DebtStatus::Active);
}

#[tokio::test]
async fn recurring_due_date_keeps_its_day_after_february() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 100_000).await;
    let debt = engine
        .create_debt(
            NewDebt::new("Rent", "Landlord", 60_000, date(2025, 1, 1), date(2025, 1, 31))
                .kind(DebtKind::Recurring)
                .monthly_payment(5_000),
            date(2025, 1, 5),
        )
        .await
        .unwrap();
    assert_eq!(debt.due_day, 31);

    for (paid_on, next_due) in [
        (date(2025, 1, 20), date(2025, 2, 28)),
        (date(2025, 2, 20), date(2025, 3, 31)),
        (date(2025, 3, 20), date(2025, 4, 30)),
        (date(2025, 4, 20), date(2025, 5, 31)),
    ] {
        engine
            .add_payment(DebtPaymentCmd::new(debt.id, 5_000, paid_on).from_account(bank.id))
            .await
            .unwrap();
        assert_eq!(engine.debt(debt.id).await.unwrap().due_date, next_due);
    }
}

#[tokio::test]
async fn refresh_moves_debts_through_the_calendar() {
    let (engine, _db) = engine_with_db().await;
    let debt = car_loan(&engine, date(2025, 3, 20)).await;

    let changed = engine
        .refresh_debt_statuses(date(2025, 4, 1))
        .await
        .unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].id, debt.id);
    assert_eq!(changed[0].status, DebtStatus::Overdue);

    assert_eq!(
        engine.list_debts(Some(DebtStatus::Overdue)).await.unwrap().len(),
        1
    );
    assert!(
        engine
            .list_debts(Some(DebtStatus::Active))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn auto_payments_run_once_per_month_and_report_failures() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 100_000).await;
    let empty = open_account(&engine, "Empty", 0).await;

    let funded = engine
        .create_debt(
            NewDebt::new("Loan", "Bank", 120_000, date(2025, 1, 1), date(2025, 3, 20))
                .interest_rate_bp(1200)
                .monthly_payment(15_000)
                .auto_pay(Some(bank.id)),
            today(),
        )
        .await
        .unwrap();
    let starved = engine
        .create_debt(
            NewDebt::new("Gym", "Club", 9_000, date(2025, 1, 1), date(2025, 3, 25))
                .monthly_payment(3_000)
                .auto_pay(Some(empty.id)),
            today(),
        )
        .await
        .unwrap();

    let report = engine.run_auto_payments(today()).await.unwrap();
    assert_eq!(report.paid(), 1);
    assert_eq!(report.failed(), 1);
    for (debt_id, outcome) in &report.attempts {
        if *debt_id == funded.id {
            assert!(matches!(outcome, AutoPayOutcome::Paid(p) if p.amount_minor == 15_000));
        } else {
            assert_eq!(*debt_id, starved.id);
            assert!(matches!(
                outcome,
                AutoPayOutcome::Failed(EngineError::InsufficientFunds(_))
            ));
        }
    }
    assert_eq!(balance(&engine, &bank).await, 85_000);

    let again = engine.run_auto_payments(today()).await.unwrap();
    assert_eq!(again.paid(), 0);
    assert!(
        again
            .attempts
            .iter()
            .any(|(id, o)| *id == funded.id && matches!(o, AutoPayOutcome::AlreadyPaid))
    );
    assert_eq!(balance(&engine, &bank).await, 85_000);
}

#[tokio::test]
async fn payment_history_is_newest_first_and_removed_with_the_debt() {
    let (engine, _db) = engine_with_db().await;
    let bank = open_account(&engine, "Bank", 100_000).await;
    let debt = car_loan(&engine, date(2025, 3, 20)).await;

    for day in [3, 9] {
        engine
            .add_payment(
                DebtPaymentCmd::new(debt.id, 2_000, date(2025, 3, day)).from_account(bank.id),
            )
            .await
            .unwrap();
    }
    let history = engine.debt_payments(debt.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].payment_date, date(2025, 3, 9));
    assert_eq!(history[1].payment_date, date(2025, 3, 3));

    engine.delete_debt(debt.id).await.unwrap();
    assert!(matches!(
        engine.debt(debt.id).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}

#[tokio::test]
async fn invalid_terms_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_debt(
            NewDebt::new("Loan", "Bank", 0, date(2025, 1, 1), date(2025, 3, 1)),
            today(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_debt(
            NewDebt::new("Loan", "Bank", 1_000, date(2025, 3, 1), date(2025, 1, 1)),
            today(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailed(_)));

    let err = engine
        .create_debt(
            NewDebt::new("Loan", " ", 1_000, date(2025, 1, 1), date(2025, 3, 1)),
            today(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ValidationFailed("creditor name must not be empty".to_string())
    );
}
