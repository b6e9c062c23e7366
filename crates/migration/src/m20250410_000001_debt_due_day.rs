use sea_orm_migration::prelude::*;

use crate::m20250101_000003_debts::Debts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum DebtDueDay {
    DueDay,
}

// 0 marks rows written before the column existed; readers fall back to the
// day of `due_date`.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Debts::Table)
                    .add_column(
                        ColumnDef::new(DebtDueDay::DueDay)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Debts::Table)
                    .drop_column(DebtDueDay::DueDay)
                    .to_owned(),
            )
            .await
    }
}
