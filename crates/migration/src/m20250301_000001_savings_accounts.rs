use sea_orm_migration::prelude::*;

use crate::m20250101_000004_savings::SavingsGoals;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum GoalAccounts {
    SavingsAccountId,
    ContributionAccountId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(SavingsGoals::Table)
                    .add_column(ColumnDef::new(GoalAccounts::SavingsAccountId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(SavingsGoals::Table)
                    .add_column(ColumnDef::new(GoalAccounts::ContributionAccountId).string())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(SavingsGoals::Table)
                    .drop_column(GoalAccounts::ContributionAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(SavingsGoals::Table)
                    .drop_column(GoalAccounts::SavingsAccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
