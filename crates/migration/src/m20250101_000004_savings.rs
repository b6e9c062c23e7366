use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum SavingsGoals {
    Table,
    Id,
    UserId,
    Name,
    TargetAmountMinor,
    CurrentAmountMinor,
    TargetDate,
    MonthlyContributionMinor,
    Category,
    Color,
    Icon,
    IsCompleted,
    CreatedAt,
}

#[derive(Iden)]
enum SavingsContributions {
    Table,
    Id,
    GoalId,
    UserId,
    AmountMinor,
    Date,
    CreatedAt,
    FromAccountId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavingsGoals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavingsGoals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavingsGoals::UserId).string().not_null())
                    .col(ColumnDef::new(SavingsGoals::Name).string().not_null())
                    .col(
                        ColumnDef::new(SavingsGoals::TargetAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavingsGoals::CurrentAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SavingsGoals::TargetDate).date())
                    .col(
                        ColumnDef::new(SavingsGoals::MonthlyContributionMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SavingsGoals::Category).string())
                    .col(ColumnDef::new(SavingsGoals::Color).string())
                    .col(ColumnDef::new(SavingsGoals::Icon).string())
                    .col(
                        ColumnDef::new(SavingsGoals::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SavingsGoals::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SavingsContributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavingsContributions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SavingsContributions::GoalId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavingsContributions::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavingsContributions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SavingsContributions::Date).date().not_null())
                    .col(
                        ColumnDef::new(SavingsContributions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavingsContributions::FromAccountId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_contributions-goal_id")
                            .from(SavingsContributions::Table, SavingsContributions::GoalId)
                            .to(SavingsGoals::Table, SavingsGoals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SavingsContributions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavingsGoals::Table).to_owned())
            .await
    }
}
