use serde::Serialize;
use uuid::Uuid;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Account, EngineError, Money, ResultEngine, accounts, transactions};

use super::{Engine, with_tx};

/// One account whose stored balance disagreed with its movement log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceCorrection {
    pub account_id: Uuid,
    pub name: String,
    pub stored_minor: i64,
    pub derived_minor: i64,
}

impl BalanceCorrection {
    /// Stored minus derived.
    pub fn drift_minor(&self) -> i64 {
        self.stored_minor - self.derived_minor
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub accounts_checked: usize,
    pub corrections: Vec<BalanceCorrection>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }
}

impl Engine {
    /// Rederives an account balance from its movements and stores it.
    ///
    /// Idempotent: a second call over the same log writes the same value.
    pub async fn recompute_balance(&self, account_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let account = Account::try_from(model)?;
            let correction = self.reconcile_account(&db_tx, &account).await?;
            let derived = correction.map_or(account.balance_minor, |c| c.derived_minor);
            Ok(Money::new(derived))
        })
    }

    /// Stored balance minus the balance rederived from the log. Read-only.
    pub async fn balance_drift(&self, account_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let derived = self.derived_balance(&db_tx, account_id).await?;
            let drift = model
                .balance_minor
                .checked_sub(derived)
                .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
            Ok(Money::new(drift))
        })
    }

    /// Reconciles every account of the owner in one transaction.
    pub async fn recompute_all(&self) -> ResultEngine<ReconcileReport> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(self.owner.as_str()))
                .order_by_asc(accounts::Column::CreatedAt)
                .order_by_asc(accounts::Column::Id)
                .all(&db_tx)
                .await?;

            let mut report = ReconcileReport {
                accounts_checked: models.len(),
                corrections: Vec::new(),
            };
            for model in models {
                let account = Account::try_from(model)?;
                if let Some(correction) = self.reconcile_account(&db_tx, &account).await? {
                    report.corrections.push(correction);
                }
            }
            tracing::info!(
                accounts = report.accounts_checked,
                corrected = report.corrections.len(),
                "balances reconciled"
            );
            Ok(report)
        })
    }

    /// Writes the derived balance when it differs from the stored one.
    async fn reconcile_account(
        &self,
        db_tx: &DatabaseTransaction,
        account: &Account,
    ) -> ResultEngine<Option<BalanceCorrection>> {
        let derived_minor = self.derived_balance(db_tx, account.id).await?;
        if derived_minor == account.balance_minor {
            return Ok(None);
        }
        tracing::warn!(
            account_id = %account.id,
            stored = %Money::new(account.balance_minor),
            derived = %Money::new(derived_minor),
            "balance drift corrected"
        );
        self.write_balance(db_tx, account.id, derived_minor).await?;
        Ok(Some(BalanceCorrection {
            account_id: account.id,
            name: account.name.clone(),
            stored_minor: account.balance_minor,
            derived_minor,
        }))
    }

    /// Income legs minus expense legs; stored amounts already carry the sign.
    async fn derived_balance(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<i64> {
        let entries: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .all(db_tx)
            .await?;
        entries.iter().try_fold(0_i64, |total, entry| {
            total
                .checked_add(entry.amount_minor)
                .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))
        })
    }
}
