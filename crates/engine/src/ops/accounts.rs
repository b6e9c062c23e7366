use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    Account, AccountFilter, AccountPatch, DebtStatus, EngineError, MovementEntry, MovementKind,
    NewAccount, ResultEngine, SystemCategory, accounts, debts, savings_contributions, savings_goals,
    transactions,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

pub(super) fn ensure_active(account: &Account) -> ResultEngine<()> {
    if !account.is_active {
        return Err(EngineError::InactiveAccount(account.name.clone()));
    }
    Ok(())
}

impl Engine {
    /// Creates an account.
    ///
    /// A non-zero `opening_balance_minor` is not written to the balance
    /// directly: it becomes an `opening_balance` movement (income when
    /// positive, expense when negative) so the reconciler can rederive it.
    pub async fn create_account(&self, new: NewAccount) -> ResultEngine<Account> {
        let name = normalize_required_name(&new.name, "account")?;
        let opening_amount = new
            .opening_balance_minor
            .checked_abs()
            .ok_or_else(|| EngineError::InvalidAmount("opening balance overflow".to_string()))?;
        with_tx!(self, |db_tx| {
            let mut account = Account::new(name, new.kind, new.currency);
            account.color = normalize_optional_text(new.color.as_deref());
            account.icon = normalize_optional_text(new.icon.as_deref());

            let mut model: accounts::ActiveModel = (&account).into();
            model.user_id = ActiveValue::Set(self.owner.clone());
            model.insert(&db_tx).await?;

            if opening_amount != 0 {
                let kind = if new.opening_balance_minor > 0 {
                    MovementKind::Income
                } else {
                    MovementKind::Expense
                };
                let date = new.opening_date.unwrap_or_else(|| Utc::now().date_naive());
                let entry = MovementEntry::new(
                    account.id,
                    kind,
                    opening_amount,
                    SystemCategory::OpeningBalance.into(),
                    date,
                )?
                .description(Some(format!("opening balance for account '{}'", account.name)));
                self.insert_movement(&db_tx, &entry).await?;
                account.balance_minor = self
                    .adjust_balance(&db_tx, account.id, entry.amount_minor)
                    .await?;
            }

            tracing::debug!(account_id = %account.id, name = %account.name, "account created");
            Ok(account)
        })
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            Account::try_from(model)
        })
    }

    /// Lists the owner's accounts, oldest first.
    pub async fn list_accounts(&self, filter: AccountFilter) -> ResultEngine<Vec<Account>> {
        let mut query =
            accounts::Entity::find().filter(accounts::Column::UserId.eq(self.owner.as_str()));
        if let Some(kind) = filter.kind {
            query = query.filter(accounts::Column::Kind.eq(kind.as_str()));
        }
        if filter.active_only {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Updates descriptive fields and the active flag. The balance is never
    /// touched here.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        patch: AccountPatch,
    ) -> ResultEngine<Account> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "account"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let mut account = Account::try_from(model)?;

            if let Some(currency) = patch.currency
                && currency != account.currency
            {
                let movements = transactions::Entity::find()
                    .filter(transactions::Column::AccountId.eq(account_id.to_string()))
                    .count(&db_tx)
                    .await?;
                if movements > 0 {
                    return Err(EngineError::ValidationFailed(format!(
                        "account '{}' already has movements in {}",
                        account.name, account.currency
                    )));
                }
                account.currency = currency;
            }
            if let Some(name) = name {
                account.name = name;
            }
            if let Some(kind) = patch.kind {
                account.kind = kind;
            }
            if let Some(color) = patch.color.as_deref() {
                account.color = normalize_optional_text(Some(color));
            }
            if let Some(icon) = patch.icon.as_deref() {
                account.icon = normalize_optional_text(Some(icon));
            }
            if let Some(is_active) = patch.is_active {
                account.is_active = is_active;
            }

            let active = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                name: ActiveValue::Set(account.name.clone()),
                kind: ActiveValue::Set(account.kind.as_str().to_string()),
                currency: ActiveValue::Set(account.currency.code().to_string()),
                color: ActiveValue::Set(account.color.clone()),
                icon: ActiveValue::Set(account.icon.clone()),
                is_active: ActiveValue::Set(account.is_active),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(account)
        })
    }

    /// Deletes an account together with its movements.
    ///
    /// Refused while an unpaid debt pays from it, a savings goal points at it
    /// or a contribution was funded from it, unless `cascade` is set. Under
    /// `cascade` debt and goal references are cleared first; contributions
    /// keep their source id and are later deleted without a refund.
    pub async fn delete_account(&self, account_id: Uuid, cascade: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let id = account_id.to_string();

            let debt_refs = debts::Entity::find()
                .filter(debts::Column::UserId.eq(self.owner.as_str()))
                .filter(debts::Column::PaymentAccountId.eq(id.clone()))
                .filter(debts::Column::Status.ne(DebtStatus::Paid.as_str()))
                .count(&db_tx)
                .await?;
            let goal_refs = savings_goals::Entity::find()
                .filter(savings_goals::Column::UserId.eq(self.owner.as_str()))
                .filter(goal_references(&id))
                .count(&db_tx)
                .await?;
            let contribution_refs = savings_contributions::Entity::find()
                .filter(savings_contributions::Column::UserId.eq(self.owner.as_str()))
                .filter(savings_contributions::Column::FromAccountId.eq(id.clone()))
                .count(&db_tx)
                .await?;

            if debt_refs + goal_refs + contribution_refs > 0 {
                if !cascade {
                    return Err(EngineError::ValidationFailed(format!(
                        "account '{}' is referenced by {debt_refs} debt(s), {goal_refs} goal(s) \
                         and {contribution_refs} contribution(s)",
                        model.name
                    )));
                }
                self.clear_account_references(&db_tx, &id).await?;
            }

            transactions::Entity::delete_many()
                .filter(transactions::Column::AccountId.eq(id))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::debug!(%account_id, cascade, "account deleted");
            Ok(())
        })
    }

    /// Overwrites the stored balance without touching the movement log. The
    /// difference shows up as drift until the next reconcile.
    pub async fn set_balance(&self, account_id: Uuid, balance_minor: i64) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let mut account = Account::try_from(model)?;
            self.write_balance(&db_tx, account_id, balance_minor).await?;
            account.balance_minor = balance_minor;
            Ok(account)
        })
    }

    pub(crate) async fn write_balance(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        balance_minor: i64,
    ) -> ResultEngine<()> {
        let active = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            balance_minor: ActiveValue::Set(balance_minor),
            ..Default::default()
        };
        active.update(db_tx).await?;
        Ok(())
    }

    /// Applies a signed delta to the stored balance and returns the new value.
    pub(crate) async fn adjust_balance(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<i64> {
        let model = self.require_account(db_tx, account_id).await?;
        let balance_minor = model
            .balance_minor
            .checked_add(delta_minor)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        self.write_balance(db_tx, account_id, balance_minor).await?;
        Ok(balance_minor)
    }

    async fn clear_account_references(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: &str,
    ) -> ResultEngine<()> {
        debts::Entity::update_many()
            .col_expr(debts::Column::PaymentAccountId, Expr::value(Option::<String>::None))
            .col_expr(debts::Column::AutoPay, Expr::value(false))
            .filter(debts::Column::UserId.eq(self.owner.as_str()))
            .filter(debts::Column::PaymentAccountId.eq(account_id))
            .exec(db_tx)
            .await?;
        savings_goals::Entity::update_many()
            .col_expr(
                savings_goals::Column::SavingsAccountId,
                Expr::value(Option::<String>::None),
            )
            .filter(savings_goals::Column::UserId.eq(self.owner.as_str()))
            .filter(savings_goals::Column::SavingsAccountId.eq(account_id))
            .exec(db_tx)
            .await?;
        savings_goals::Entity::update_many()
            .col_expr(
                savings_goals::Column::ContributionAccountId,
                Expr::value(Option::<String>::None),
            )
            .filter(savings_goals::Column::UserId.eq(self.owner.as_str()))
            .filter(savings_goals::Column::ContributionAccountId.eq(account_id))
            .exec(db_tx)
            .await?;
        Ok(())
    }
}

fn goal_references(account_id: &str) -> Condition {
    Condition::any()
        .add(savings_goals::Column::SavingsAccountId.eq(account_id))
        .add(savings_goals::Column::ContributionAccountId.eq(account_id))
}
