use serde::Serialize;
use uuid::Uuid;

use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    Account, EngineError, Money, MovementEntry, MovementKind, ResultEngine, TransferCmd,
    util::{normalize_optional_text, require_positive},
};

use super::{Engine, accounts::ensure_active, with_tx};

/// The two movement entries a transfer produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Debit leg on the source account.
    pub expense_id: Uuid,
    /// Credit leg on the destination account.
    pub income_id: Uuid,
}

impl Engine {
    /// Moves money between two accounts of the same currency.
    ///
    /// Checks run in a fixed order: both accounts exist and differ, both are
    /// active, the amount is positive, the source can cover it. Both entries and
    /// both balance writes commit together.
    pub async fn execute_transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        with_tx!(self, |db_tx| self.transfer_in_tx(&db_tx, &cmd).await)
    }

    /// The transfer primitive, run inside a caller-owned transaction so
    /// savings flows can bundle it with their own writes.
    pub(crate) async fn transfer_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &TransferCmd,
    ) -> ResultEngine<TransferReceipt> {
        let from = Account::try_from(self.require_account(db_tx, cmd.from_account_id).await?)?;
        let to = Account::try_from(self.require_account(db_tx, cmd.to_account_id).await?)?;
        if from.id == to.id {
            return Err(EngineError::ValidationFailed(
                "source and destination accounts must differ".to_string(),
            ));
        }

        ensure_active(&from)?;
        ensure_active(&to)?;
        require_positive(cmd.amount_minor, "transfer amount")?;
        if from.currency != to.currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "{} ({}) -> {} ({})",
                from.name, from.currency, to.name, to.currency
            )));
        }
        if !from.can_cover(cmd.amount_minor) {
            return Err(EngineError::InsufficientFunds(format!(
                "'{}' has {}, needs {}",
                from.name,
                Money::new(from.balance_minor),
                Money::new(cmd.amount_minor)
            )));
        }
        let credited = to
            .balance_minor
            .checked_add(cmd.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;

        let description = normalize_optional_text(cmd.description.as_deref());
        let expense = MovementEntry::new(
            from.id,
            MovementKind::Expense,
            cmd.amount_minor,
            cmd.category.clone(),
            cmd.date,
        )?
        .description(description.clone());
        let income = MovementEntry::new(
            to.id,
            MovementKind::Income,
            cmd.amount_minor,
            cmd.category.clone(),
            cmd.date,
        )?
        .description(description);

        self.insert_movement(db_tx, &expense).await?;
        self.insert_movement(db_tx, &income).await?;
        self.write_balance(db_tx, from.id, from.balance_minor - cmd.amount_minor)
            .await?;
        self.write_balance(db_tx, to.id, credited).await?;

        tracing::debug!(
            from = %from.id,
            to = %to.id,
            amount = %Money::new(cmd.amount_minor),
            category = %cmd.category,
            "transfer applied"
        );
        Ok(TransferReceipt {
            expense_id: expense.id,
            income_id: income.id,
        })
    }
}
