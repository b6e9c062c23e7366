use sea_orm_migration::prelude::*;

use crate::m20250101_000003_debts::Debts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum DebtAutoPay {
    AutoPay,
    PaymentAccountId,
}

// SQLite accepts a single change per ALTER TABLE statement.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Debts::Table)
                    .add_column(
                        ColumnDef::new(DebtAutoPay::AutoPay)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Debts::Table)
                    .add_column(ColumnDef::new(DebtAutoPay::PaymentAccountId).string())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Debts::Table)
                    .drop_column(DebtAutoPay::PaymentAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Debts::Table)
                    .drop_column(DebtAutoPay::AutoPay)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
