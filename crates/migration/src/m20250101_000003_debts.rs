use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Debts {
    Table,
    Id,
    UserId,
    Name,
    Creditor,
    InitialAmountMinor,
    CurrentAmountMinor,
    InterestRateBp,
    MonthlyPaymentMinor,
    StartDate,
    DueDate,
    DueMonth,
    Status,
    Category,
    Color,
    Notes,
    CreatedAt,
    #[iden = "type"]
    Kind,
}

#[derive(Iden)]
enum DebtPayments {
    Table,
    Id,
    DebtId,
    UserId,
    AmountMinor,
    PaymentDate,
    PaymentStatus,
    CreatedAt,
    FromAccountId,
    PrincipalMinor,
    InterestMinor,
    RemainingBalanceMinor,
    PaymentMonth,
    MovementId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Debts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Debts::UserId).string().not_null())
                    .col(ColumnDef::new(Debts::Name).string().not_null())
                    .col(ColumnDef::new(Debts::Creditor).string().not_null())
                    .col(
                        ColumnDef::new(Debts::InitialAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Debts::CurrentAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Debts::InterestRateBp)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Debts::MonthlyPaymentMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Debts::StartDate).date().not_null())
                    .col(ColumnDef::new(Debts::DueDate).date().not_null())
                    .col(ColumnDef::new(Debts::DueMonth).string().not_null())
                    .col(ColumnDef::new(Debts::Status).string().not_null())
                    .col(ColumnDef::new(Debts::Category).string())
                    .col(ColumnDef::new(Debts::Color).string())
                    .col(ColumnDef::new(Debts::Notes).string())
                    .col(ColumnDef::new(Debts::CreatedAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Debts::Kind)
                            .string()
                            .not_null()
                            .default("single"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-user_id-due_month")
                    .table(Debts::Table)
                    .col(Debts::UserId)
                    .col(Debts::DueMonth)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DebtPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DebtPayments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DebtPayments::DebtId).string().not_null())
                    .col(ColumnDef::new(DebtPayments::UserId).string().not_null())
                    .col(
                        ColumnDef::new(DebtPayments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DebtPayments::PaymentDate).date().not_null())
                    .col(
                        ColumnDef::new(DebtPayments::PaymentStatus)
                            .string()
                            .not_null()
                            .default("completed"),
                    )
                    .col(
                        ColumnDef::new(DebtPayments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtPayments::FromAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtPayments::PrincipalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtPayments::InterestMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtPayments::RemainingBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtPayments::PaymentMonth)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DebtPayments::MovementId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-debt_payments-debt_id")
                            .from(DebtPayments::Table, DebtPayments::DebtId)
                            .to(Debts::Table, Debts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debt_payments-debt_id-payment_month")
                    .table(DebtPayments::Table)
                    .col(DebtPayments::DebtId)
                    .col(DebtPayments::PaymentMonth)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DebtPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await
    }
}
