pub use sea_orm_migration::prelude::*;

mod m20250101_000001_accounts;
mod m20250101_000002_transactions;
mod m20250101_000003_debts;
mod m20250101_000004_savings;
mod m20250215_000001_debt_auto_pay;
mod m20250301_000001_savings_accounts;
mod m20250410_000001_debt_due_day;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_accounts::Migration),
            Box::new(m20250101_000002_transactions::Migration),
            Box::new(m20250101_000003_debts::Migration),
            Box::new(m20250101_000004_savings::Migration),
            Box::new(m20250215_000001_debt_auto_pay::Migration),
            Box::new(m20250301_000001_savings_accounts::Migration),
            Box::new(m20250410_000001_debt_due_day::Migration),
        ]
    }
}
