//! Maps parsed subcommands onto engine operations and prints the results.

use chrono::{Local, NaiveDate};
use engine::{
    AccountFilter, AccountPatch, AutoPayOutcome, Category, ContributionCmd, DateRange,
    DebtPaymentCmd, Engine, Money, MovementKind, NewAccount, NewDebt, NewMovement,
    NewSavingsGoal, RefundOutcome, TransferCmd,
};
use serde::Serialize;

use crate::{
    cli::{AccountCommand, Command, DebtCommand, GoalCommand, TxCommand},
    error::{AppError, Result},
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(engine: &Engine, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Account { command } => account(engine, command, json).await,
        Command::Tx { command } => tx(engine, command, json).await,
        Command::Transfer(args) => {
            let mut cmd = TransferCmd::new(
                args.from,
                args.to,
                args.amount.minor(),
                args.date.unwrap_or_else(today),
            );
            if let Some(description) = args.description {
                cmd = cmd.description(description);
            }
            let receipt = engine.execute_transfer(cmd).await?;
            if json {
                return print_json(&receipt);
            }
            println!(
                "transferred {}: {} -> {}",
                args.amount, receipt.expense_id, receipt.income_id
            );
            Ok(())
        }
        Command::Debt { command } => debt(engine, command, json).await,
        Command::Goal { command } => goal(engine, command, json).await,
        Command::Reconcile { account } => reconcile(engine, account, json).await,
    }
}

async fn account(engine: &Engine, command: AccountCommand, json: bool) -> Result<()> {
    match command {
        AccountCommand::Add(args) => {
            let mut new = NewAccount::new(args.name, args.kind, args.currency);
            if let Some(opening) = args.opening {
                new = new.opening_balance(opening.minor(), args.date.unwrap_or_else(today));
            }
            let account = engine.create_account(new).await?;
            if json {
                return print_json(&account);
            }
            println!("created account: {} ({})", account.name, account.id);
        }
        AccountCommand::List { kind, active } => {
            let accounts = engine
                .list_accounts(AccountFilter {
                    kind,
                    active_only: active,
                })
                .await?;
            if json {
                return print_json(&accounts);
            }
            for account in accounts {
                println!(
                    "{}  {:<20} {:<10} {:>12} {}{}",
                    account.id,
                    account.name,
                    account.kind.as_str(),
                    Money::new(account.balance_minor),
                    account.currency,
                    if account.is_active { "" } else { "  (inactive)" }
                );
            }
        }
        AccountCommand::Deactivate { id } => {
            let account = engine
                .update_account(id, AccountPatch::default().active(false))
                .await?;
            println!("deactivated account: {}", account.name);
        }
    }
    Ok(())
}

async fn tx(engine: &Engine, command: TxCommand, json: bool) -> Result<()> {
    match command {
        TxCommand::Add(args) => {
            let kind = if args.amount.is_negative() {
                MovementKind::Expense
            } else {
                MovementKind::Income
            };
            let amount_minor = args
                .amount
                .minor()
                .checked_abs()
                .ok_or_else(|| AppError::Argument("amount out of range".to_string()))?;
            let mut new = NewMovement::new(
                args.account,
                kind,
                amount_minor,
                Category::parse(&args.category),
                args.date.unwrap_or_else(today),
            );
            if let Some(description) = args.description {
                new = new.description(description);
            }
            let entry = engine.record_movement(new).await?;
            if json {
                return print_json(&entry);
            }
            println!("recorded {} ({})", Money::new(entry.amount_minor), entry.id);
        }
        TxCommand::List { account, from, to } => {
            let entries = engine.movements(account, DateRange { from, to }).await?;
            if json {
                return print_json(&entries);
            }
            for entry in entries {
                println!(
                    "{}  {:>12}  {:<16} {}",
                    entry.date,
                    Money::new(entry.amount_minor),
                    entry.category,
                    entry.description.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

async fn debt(engine: &Engine, command: DebtCommand, json: bool) -> Result<()> {
    let today = today();
    match command {
        DebtCommand::Add(args) => {
            let mut new = NewDebt::new(
                args.name,
                args.creditor,
                args.amount.minor(),
                args.start.unwrap_or(today),
                args.due,
            )
            .kind(args.kind)
            .interest_rate_bp(args.rate.unwrap_or(0))
            .monthly_payment(args.monthly.map_or(0, Money::minor));
            if args.auto_pay {
                new = new.auto_pay(args.account);
            } else if let Some(account_id) = args.account {
                new = new.payment_account(account_id);
            }
            let debt = engine.create_debt(new, today).await?;
            if json {
                return print_json(&debt);
            }
            println!(
                "created debt: {} ({}), {}",
                debt.name,
                debt.id,
                debt.status.as_str()
            );
        }
        DebtCommand::List { status } => {
            let debts = engine.list_debts(status).await?;
            if json {
                return print_json(&debts);
            }
            for debt in debts {
                println!(
                    "{}  {:<20} {:<16} {:>12}  due {}  {}",
                    debt.id,
                    debt.name,
                    debt.creditor,
                    Money::new(debt.current_amount_minor),
                    debt.due_date,
                    debt.status.as_str()
                );
            }
        }
        DebtCommand::Pay(args) => {
            let mut cmd =
                DebtPaymentCmd::new(args.debt, args.amount.minor(), args.date.unwrap_or(today));
            if let Some(account_id) = args.from {
                cmd = cmd.from_account(account_id);
            }
            let payment = engine.add_payment(cmd).await?;
            if json {
                return print_json(&payment);
            }
            println!(
                "paid {}: principal {}, interest {}, remaining {}",
                Money::new(payment.amount_minor),
                Money::new(payment.principal_minor),
                Money::new(payment.interest_minor),
                Money::new(payment.remaining_balance_minor)
            );
        }
        DebtCommand::Refresh => {
            let changed = engine.refresh_debt_statuses(today).await?;
            if json {
                return print_json(&changed);
            }
            for debt in &changed {
                println!("{}: {}", debt.name, debt.status.as_str());
            }
            println!("{} debt(s) changed status", changed.len());
        }
        DebtCommand::Autopay => {
            let report = engine.run_auto_payments(today).await?;
            for (debt_id, outcome) in &report.attempts {
                match outcome {
                    AutoPayOutcome::Paid(payment) => {
                        println!("{debt_id}: paid {}", Money::new(payment.amount_minor));
                    }
                    AutoPayOutcome::AlreadyPaid => println!("{debt_id}: already paid this month"),
                    AutoPayOutcome::Failed(err) => println!("{debt_id}: failed: {err}"),
                }
            }
            println!("{} paid, {} failed", report.paid(), report.failed());
        }
    }
    Ok(())
}

async fn goal(engine: &Engine, command: GoalCommand, json: bool) -> Result<()> {
    match command {
        GoalCommand::Add(args) => {
            let mut new = NewSavingsGoal::new(args.name, args.target.minor());
            if let Some(by) = args.by {
                new = new.target_date(by);
            }
            if let Some(account_id) = args.savings_account {
                new = new.savings_account(account_id);
            }
            let goal = engine.create_savings_goal(new).await?;
            if json {
                return print_json(&goal);
            }
            println!("created goal: {} ({})", goal.name, goal.id);
        }
        GoalCommand::List => {
            let goals = engine.list_savings_goals().await?;
            if json {
                return print_json(&goals);
            }
            for goal in goals {
                println!(
                    "{}  {:<20} {:>12} / {:>12}{}",
                    goal.id,
                    goal.name,
                    Money::new(goal.current_amount_minor),
                    Money::new(goal.target_amount_minor),
                    if goal.is_completed { "  done" } else { "" }
                );
            }
        }
        GoalCommand::Contribute(args) => {
            let mut cmd = ContributionCmd::new(
                args.goal,
                args.amount.minor(),
                args.date.unwrap_or_else(today),
            );
            if let Some(account_id) = args.from {
                cmd = cmd.from_account(account_id);
            }
            let contribution = engine.add_contribution(cmd).await?;
            if json {
                return print_json(&contribution);
            }
            println!(
                "contributed {} ({})",
                Money::new(contribution.amount_minor),
                contribution.id
            );
        }
        GoalCommand::Refund { contribution, date } => {
            let outcome = engine
                .delete_contribution_with_refund(contribution, date.unwrap_or_else(today))
                .await?;
            if json {
                return print_json(&outcome);
            }
            match outcome {
                RefundOutcome::Refunded(_) => println!("contribution refunded"),
                RefundOutcome::Skipped { shortfall_minor } => println!(
                    "contribution deleted, refund skipped: savings account short by {}",
                    Money::new(shortfall_minor)
                ),
                RefundOutcome::SourceGone => {
                    println!("contribution deleted, source account is gone: money stays in savings")
                }
            }
        }
    }
    Ok(())
}

async fn reconcile(engine: &Engine, account: Option<uuid::Uuid>, json: bool) -> Result<()> {
    if let Some(account_id) = account {
        let drift = engine.balance_drift(account_id).await?;
        let balance = engine.recompute_balance(account_id).await?;
        if json {
            return print_json(&serde_json::json!({
                "account_id": account_id,
                "balance_minor": balance.minor(),
                "drift_minor": drift.minor(),
            }));
        }
        println!("balance {balance} (corrected drift {drift})");
        return Ok(());
    }

    let report = engine.recompute_all().await?;
    if json {
        return print_json(&report);
    }
    for correction in &report.corrections {
        println!(
            "{}: {} -> {}",
            correction.name,
            Money::new(correction.stored_minor),
            Money::new(correction.derived_minor)
        );
    }
    println!(
        "{} account(s) checked, {} corrected",
        report.accounts_checked,
        report.corrections.len()
    );
    Ok(())
}
