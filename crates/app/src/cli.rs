use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{AccountKind, Currency, DebtKind, DebtStatus, Money};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "pocketbook")]
#[command(about = "Personal ledger: accounts, transfers, debts and savings goals")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the database connection string.
    #[arg(long, global = true)]
    pub database_url: Option<String>,
    /// Override the log level (e.g. debug, info, warn).
    #[arg(long, global = true)]
    pub level: Option<String>,
    /// Override the ledger owner.
    #[arg(long, global = true)]
    pub owner: Option<String>,
    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage accounts.
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Record and list incomes and expenses.
    Tx {
        #[command(subcommand)]
        command: TxCommand,
    },
    /// Move money between two accounts.
    Transfer(TransferArgs),
    /// Manage debts and their payments.
    Debt {
        #[command(subcommand)]
        command: DebtCommand,
    },
    /// Manage savings goals.
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },
    /// Rebuild stored balances from the movement log.
    Reconcile {
        /// Only this account.
        #[arg(long, value_parser = parse_id)]
        account: Option<Uuid>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    Add(AccountAddArgs),
    List {
        #[arg(long, value_parser = parse_account_kind)]
        kind: Option<AccountKind>,
        /// Hide deactivated accounts.
        #[arg(long)]
        active: bool,
    },
    Deactivate {
        #[arg(value_parser = parse_id)]
        id: Uuid,
    },
}

#[derive(Debug, Args)]
pub struct AccountAddArgs {
    pub name: String,
    #[arg(long, default_value = "bank", value_parser = parse_account_kind)]
    pub kind: AccountKind,
    #[arg(long, default_value = "EUR", value_parser = parse_currency)]
    pub currency: Currency,
    /// Opening balance, e.g. `1250.00`.
    #[arg(long, value_parser = parse_money)]
    pub opening: Option<Money>,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
pub enum TxCommand {
    Add(TxAddArgs),
    List {
        #[arg(value_parser = parse_id)]
        account: Uuid,
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
    },
}

#[derive(Debug, Args)]
pub struct TxAddArgs {
    #[arg(value_parser = parse_id)]
    pub account: Uuid,
    /// Signed amount: negative for an expense.
    #[arg(allow_hyphen_values = true, value_parser = parse_money)]
    pub amount: Money,
    pub category: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct TransferArgs {
    #[arg(value_parser = parse_id)]
    pub from: Uuid,
    #[arg(value_parser = parse_id)]
    pub to: Uuid,
    #[arg(value_parser = parse_money)]
    pub amount: Money,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
pub enum DebtCommand {
    Add(DebtAddArgs),
    List {
        #[arg(long, value_parser = parse_debt_status)]
        status: Option<DebtStatus>,
    },
    Pay(DebtPayArgs),
    /// Move every debt to the status it has today.
    Refresh,
    /// Pay every auto-pay debt due this month.
    Autopay,
}

#[derive(Debug, Args)]
pub struct DebtAddArgs {
    pub name: String,
    #[arg(long)]
    pub creditor: String,
    #[arg(long, value_parser = parse_money)]
    pub amount: Money,
    #[arg(long, value_parser = parse_date)]
    pub due: NaiveDate,
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,
    #[arg(long, default_value = "single", value_parser = parse_debt_kind)]
    pub kind: DebtKind,
    /// Annual interest rate in percent, e.g. `12.5`.
    #[arg(long, value_parser = parse_rate)]
    pub rate: Option<i64>,
    #[arg(long, value_parser = parse_money)]
    pub monthly: Option<Money>,
    /// Pay automatically each month.
    #[arg(long)]
    pub auto_pay: bool,
    #[arg(long, value_parser = parse_id)]
    pub account: Option<Uuid>,
}

#[derive(Debug, Args)]
pub struct DebtPayArgs {
    #[arg(value_parser = parse_id)]
    pub debt: Uuid,
    #[arg(value_parser = parse_money)]
    pub amount: Money,
    #[arg(long, value_parser = parse_id)]
    pub from: Option<Uuid>,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
pub enum GoalCommand {
    Add(GoalAddArgs),
    List,
    Contribute(GoalContributeArgs),
    /// Delete a contribution and return its money to the source account.
    Refund {
        #[arg(value_parser = parse_id)]
        contribution: Uuid,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Args)]
pub struct GoalAddArgs {
    pub name: String,
    #[arg(long, value_parser = parse_money)]
    pub target: Money,
    #[arg(long, value_parser = parse_date)]
    pub by: Option<NaiveDate>,
    #[arg(long, value_parser = parse_id)]
    pub savings_account: Option<Uuid>,
}

#[derive(Debug, Args)]
pub struct GoalContributeArgs {
    #[arg(value_parser = parse_id)]
    pub goal: Uuid,
    #[arg(value_parser = parse_money)]
    pub amount: Money,
    #[arg(long, value_parser = parse_id)]
    pub from: Option<Uuid>,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid id '{raw}': {err}"))
}

fn parse_money(raw: &str) -> Result<Money, String> {
    Money::from_str(raw).map_err(|err| err.to_string())
}

/// Percent with up to two decimals, returned in basis points.
fn parse_rate(raw: &str) -> Result<i64, String> {
    let rate = Money::from_str(raw).map_err(|err| err.to_string())?;
    if rate.is_negative() {
        return Err("interest rate must be >= 0".to_string());
    }
    Ok(rate.minor())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::try_from(raw).map_err(|err| err.to_string())
}

fn parse_account_kind(raw: &str) -> Result<AccountKind, String> {
    AccountKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_debt_kind(raw: &str) -> Result<DebtKind, String> {
    DebtKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_debt_status(raw: &str) -> Result<DebtStatus, String> {
    DebtStatus::try_from(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_read_as_basis_points() {
        assert_eq!(parse_rate("12"), Ok(1200));
        assert_eq!(parse_rate("7.25"), Ok(725));
        assert!(parse_rate("-1").is_err());
    }

    #[test]
    fn dates_use_iso_format() {
        assert_eq!(
            parse_date("2025-03-10"),
            Ok(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
        );
        assert!(parse_date("10/03/2025").is_err());
    }

    #[test]
    fn negative_amounts_parse_for_expenses() {
        let cli = Cli::try_parse_from([
            "pocketbook",
            "tx",
            "add",
            "0b7e4f3a-5d1c-4b8e-9a0f-2c6d8e1f3a5b",
            "-12.50",
            "groceries",
        ])
        .unwrap();
        let Command::Tx {
            command: TxCommand::Add(args),
        } = cli.command
        else {
            panic!("expected tx add");
        };
        assert_eq!(args.amount, Money::new(-1250));
    }
}
