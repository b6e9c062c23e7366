use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Account, DateRange, EngineError, MovementEntry, NewMovement, ResultEngine, transactions,
    util::normalize_optional_text,
};

use super::{Engine, accounts::ensure_active, with_tx};

fn validate_range(range: &DateRange) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (range.from, range.to)
        && from > to
    {
        return Err(EngineError::ValidationFailed(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

fn build_entry(new: &NewMovement) -> ResultEngine<MovementEntry> {
    if new.category.as_str().is_empty() {
        return Err(EngineError::ValidationFailed(
            "category must not be empty".to_string(),
        ));
    }
    let mut entry = MovementEntry::new(
        new.account_id,
        new.kind,
        new.amount_minor,
        new.category.clone(),
        new.date,
    )?
    .description(normalize_optional_text(new.description.as_deref()));
    entry.recurrence = new.recurrence;
    entry.parent_id = new.parent_id;
    Ok(entry)
}

impl Engine {
    /// Appends one entry to the movement log. Pure insert: the account
    /// balance is left alone.
    pub async fn append_movement(&self, new: NewMovement) -> ResultEngine<MovementEntry> {
        let entry = build_entry(&new)?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, entry.account_id).await?;
            self.insert_movement(&db_tx, &entry).await?;
            Ok(entry)
        })
    }

    pub async fn movement(&self, movement_id: Uuid) -> ResultEngine<MovementEntry> {
        with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            MovementEntry::try_from(model)
        })
    }

    /// Movements of one account in `range`, ordered by date, then creation
    /// time, then id.
    pub async fn movements(
        &self,
        account_id: Uuid,
        range: DateRange,
    ) -> ResultEngine<Vec<MovementEntry>> {
        validate_range(&range)?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account_id.to_string()));
            if let Some(from) = range.from {
                query = query.filter(transactions::Column::Date.gte(from));
            }
            if let Some(to) = range.to {
                query = query.filter(transactions::Column::Date.lte(to));
            }
            query
                .order_by_asc(transactions::Column::Date)
                .order_by_asc(transactions::Column::CreatedAt)
                .order_by_asc(transactions::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(MovementEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Removes an entry from the log without touching balances. Reversal
    /// flows pair this with their own balance write.
    pub async fn delete_movement(&self, movement_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            transactions::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Records a user income or expense: the entry and the balance change
    /// land together.
    pub async fn record_movement(&self, new: NewMovement) -> ResultEngine<MovementEntry> {
        if new.category.is_system() {
            return Err(EngineError::ValidationFailed(format!(
                "category '{}' is reserved",
                new.category
            )));
        }
        let entry = build_entry(&new)?;
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, entry.account_id).await?;
            ensure_active(&Account::try_from(model)?)?;
            self.insert_movement(&db_tx, &entry).await?;
            let balance_minor = self
                .adjust_balance(&db_tx, entry.account_id, entry.amount_minor)
                .await?;
            tracing::debug!(
                movement_id = %entry.id,
                account_id = %entry.account_id,
                amount_minor = entry.amount_minor,
                balance_minor,
                "movement recorded"
            );
            Ok(entry)
        })
    }

    /// Deletes a user-recorded entry and reverses its effect on the balance.
    ///
    /// Entries carrying a system category belong to a paired flow (transfer,
    /// debt payment, savings) and cannot be voided one leg at a time.
    pub async fn void_movement(&self, movement_id: Uuid) -> ResultEngine<MovementEntry> {
        with_tx!(self, |db_tx| {
            let model = self.require_movement(&db_tx, movement_id).await?;
            let entry = MovementEntry::try_from(model)?;
            if entry.category.is_system() {
                return Err(EngineError::ValidationFailed(format!(
                    "movement {movement_id} belongs to a '{}' flow",
                    entry.category
                )));
            }
            let reversal = entry
                .amount_minor
                .checked_neg()
                .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
            transactions::Entity::delete_by_id(entry.id.to_string())
                .exec(&db_tx)
                .await?;
            self.adjust_balance(&db_tx, entry.account_id, reversal)
                .await?;
            tracing::debug!(movement_id = %entry.id, "movement voided");
            Ok(entry)
        })
    }

    pub(crate) async fn insert_movement(
        &self,
        db_tx: &DatabaseTransaction,
        entry: &MovementEntry,
    ) -> ResultEngine<()> {
        let mut model: transactions::ActiveModel = entry.into();
        model.user_id = ActiveValue::Set(self.owner.clone());
        model.insert(db_tx).await?;
        Ok(())
    }

    async fn require_movement(
        &self,
        db_tx: &DatabaseTransaction,
        movement_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(movement_id.to_string())
            .filter(transactions::Column::UserId.eq(self.owner.as_str()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("movement {movement_id}")))
    }
}
