use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    Account, Debt, DebtKind, DebtPatch, DebtPayment, DebtPaymentCmd, DebtStatus, EngineError,
    Money, MovementEntry, MovementKind, NewDebt, PaymentRejection, ResultEngine, SystemCategory,
    debt_payments, debts,
    debts::validate_terms,
    util::{month_key, next_month, normalize_optional_text, normalize_required_name, require_positive},
};

use super::{Engine, accounts::ensure_active, with_tx};

/// Result of one auto-payment attempt.
#[derive(Debug)]
pub enum AutoPayOutcome {
    Paid(DebtPayment),
    /// A payment for the current month already exists.
    AlreadyPaid,
    Failed(EngineError),
}

#[derive(Debug, Default)]
pub struct AutoPayReport {
    pub attempts: Vec<(Uuid, AutoPayOutcome)>,
}

impl AutoPayReport {
    pub fn paid(&self) -> usize {
        self.attempts
            .iter()
            .filter(|(_, outcome)| matches!(outcome, AutoPayOutcome::Paid(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempts
            .iter()
            .filter(|(_, outcome)| matches!(outcome, AutoPayOutcome::Failed(_)))
            .count()
    }
}

impl Engine {
    /// Registers a debt. `due_month` and the initial status are derived from
    /// `due_date` and `today`.
    pub async fn create_debt(&self, new: NewDebt, today: NaiveDate) -> ResultEngine<Debt> {
        let name = normalize_required_name(&new.name, "debt")?;
        let creditor = normalize_required_name(&new.creditor, "creditor")?;
        let current_amount_minor = new.current_amount_minor.unwrap_or(new.initial_amount_minor);
        validate_terms(
            new.initial_amount_minor,
            current_amount_minor,
            new.interest_rate_bp,
            new.monthly_payment_minor,
            new.start_date,
            new.due_date,
        )?;
        with_tx!(self, |db_tx| {
            if let Some(account_id) = new.payment_account_id {
                self.require_account(&db_tx, account_id).await?;
            }
            let mut debt = Debt {
                id: Uuid::new_v4(),
                name,
                creditor,
                kind: new.kind,
                initial_amount_minor: new.initial_amount_minor,
                current_amount_minor,
                interest_rate_bp: new.interest_rate_bp,
                monthly_payment_minor: new.monthly_payment_minor,
                start_date: new.start_date,
                due_date: new.due_date,
                due_month: month_key(new.due_date),
                due_day: new.due_date.day(),
                status: DebtStatus::Future,
                category: normalize_optional_text(new.category.as_deref()),
                color: normalize_optional_text(new.color.as_deref()),
                notes: normalize_optional_text(new.notes.as_deref()),
                auto_pay: new.auto_pay,
                payment_account_id: new.payment_account_id,
                created_at: Utc::now(),
            };
            debt.status = debt.derive_status(today);

            let mut model: debts::ActiveModel = (&debt).into();
            model.user_id = ActiveValue::Set(self.owner.clone());
            model.insert(&db_tx).await?;
            Ok(debt)
        })
    }

    pub async fn debt(&self, debt_id: Uuid) -> ResultEngine<Debt> {
        with_tx!(self, |db_tx| self.require_debt(&db_tx, debt_id).await)
    }

    /// Lists debts ordered by due date, optionally only those in `status`.
    pub async fn list_debts(&self, status: Option<DebtStatus>) -> ResultEngine<Vec<Debt>> {
        let mut query = debts::Entity::find().filter(debts::Column::UserId.eq(self.owner.as_str()));
        if let Some(status) = status {
            query = query.filter(debts::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_asc(debts::Column::DueDate)
            .order_by_asc(debts::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Debt::try_from)
            .collect()
    }

    /// Manual edit. The only path that can move a debt out of `paid`.
    pub async fn update_debt(
        &self,
        debt_id: Uuid,
        patch: DebtPatch,
        today: NaiveDate,
    ) -> ResultEngine<Debt> {
        with_tx!(self, |db_tx| {
            let mut debt = self.require_debt(&db_tx, debt_id).await?;
            if let Some(name) = patch.name.as_deref() {
                debt.name = normalize_required_name(name, "debt")?;
            }
            if let Some(creditor) = patch.creditor.as_deref() {
                debt.creditor = normalize_required_name(creditor, "creditor")?;
            }
            if let Some(kind) = patch.kind {
                debt.kind = kind;
            }
            if let Some(current) = patch.current_amount_minor {
                debt.current_amount_minor = current;
            }
            if let Some(rate) = patch.interest_rate_bp {
                debt.interest_rate_bp = rate;
            }
            if let Some(monthly) = patch.monthly_payment_minor {
                debt.monthly_payment_minor = monthly;
            }
            if let Some(due_date) = patch.due_date {
                debt.due_date = due_date;
                debt.due_month = month_key(due_date);
                debt.due_day = due_date.day();
            }
            if let Some(notes) = patch.notes.as_deref() {
                debt.notes = normalize_optional_text(Some(notes));
            }
            if let Some(auto_pay) = patch.auto_pay {
                debt.auto_pay = auto_pay;
            }
            if let Some(payment_account_id) = patch.payment_account_id {
                if let Some(account_id) = payment_account_id {
                    self.require_account(&db_tx, account_id).await?;
                }
                debt.payment_account_id = payment_account_id;
            }
            validate_terms(
                debt.initial_amount_minor,
                debt.current_amount_minor,
                debt.interest_rate_bp,
                debt.monthly_payment_minor,
                debt.start_date,
                debt.due_date,
            )?;
            debt.status = debt.derive_status(today);

            let model: debts::ActiveModel = (&debt).into();
            model.update(&db_tx).await?;
            Ok(debt)
        })
    }

    /// Deletes a debt and its payment history. Movements already booked
    /// against accounts stay in the log.
    pub async fn delete_debt(&self, debt_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let debt = self.require_debt(&db_tx, debt_id).await?;
            debt_payments::Entity::delete_many()
                .filter(debt_payments::Column::DebtId.eq(debt.id.to_string()))
                .exec(&db_tx)
                .await?;
            debts::Entity::delete_by_id(debt.id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// `None` when a payment would be accepted on `today`.
    pub async fn debt_eligibility(
        &self,
        debt_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<Option<PaymentRejection>> {
        let debt = self.debt(debt_id).await?;
        Ok(debt.eligibility(today).err())
    }

    /// Moves every debt to the status the calendar puts it in and returns the
    /// debts whose status changed. `paid` is left alone.
    pub async fn refresh_debt_statuses(&self, today: NaiveDate) -> ResultEngine<Vec<Debt>> {
        with_tx!(self, |db_tx| {
            let models = debts::Entity::find()
                .filter(debts::Column::UserId.eq(self.owner.as_str()))
                .filter(debts::Column::Status.ne(DebtStatus::Paid.as_str()))
                .all(&db_tx)
                .await?;

            let mut changed = Vec::new();
            for model in models {
                let mut debt = Debt::try_from(model)?;
                let next = debt.status_on(today);
                if next == debt.status {
                    continue;
                }
                tracing::info!(
                    debt_id = %debt.id,
                    from = debt.status.as_str(),
                    to = next.as_str(),
                    "debt status changed"
                );
                debt.status = next;
                let active = debts::ActiveModel {
                    id: ActiveValue::Set(debt.id.to_string()),
                    status: ActiveValue::Set(next.as_str().to_string()),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
                changed.push(debt);
            }
            Ok(changed)
        })
    }

    /// Pays towards a debt.
    ///
    /// The source account is the explicit one, else the debt's payment
    /// account, else whatever the resolution strategy picks. Interest is
    /// covered first, the rest reduces the principal. The debit, its
    /// `debt_payment` movement, the audit row and the debt update commit
    /// together.
    pub async fn add_payment(&self, cmd: DebtPaymentCmd) -> ResultEngine<DebtPayment> {
        with_tx!(self, |db_tx| {
            let mut debt = self.require_debt(&db_tx, cmd.debt_id).await?;
            debt.eligibility(cmd.paid_on)
                .map_err(EngineError::IneligiblePayment)?;
            require_positive(cmd.amount_minor, "payment amount")?;

            let source = match cmd.from_account_id.or(debt.payment_account_id) {
                Some(account_id) => {
                    Account::try_from(self.require_account(&db_tx, account_id).await?)?
                }
                None => {
                    self.resolve_funding_source(&db_tx, cmd.amount_minor, None, None)
                        .await?
                }
            };
            ensure_active(&source)?;
            if !source.can_cover(cmd.amount_minor) {
                return Err(EngineError::InsufficientFunds(format!(
                    "'{}' has {}, needs {}",
                    source.name,
                    Money::new(source.balance_minor),
                    Money::new(cmd.amount_minor)
                )));
            }

            let split = debt.split_payment(cmd.amount_minor);
            let description = normalize_optional_text(cmd.note.as_deref())
                .unwrap_or_else(|| format!("payment to {} ({})", debt.creditor, debt.name));
            let entry = MovementEntry::new(
                source.id,
                MovementKind::Expense,
                cmd.amount_minor,
                SystemCategory::DebtPayment.into(),
                cmd.paid_on,
            )?
            .description(Some(description));
            self.insert_movement(&db_tx, &entry).await?;
            self.write_balance(&db_tx, source.id, source.balance_minor - cmd.amount_minor)
                .await?;

            let payment = DebtPayment {
                id: Uuid::new_v4(),
                debt_id: debt.id,
                amount_minor: cmd.amount_minor,
                payment_date: cmd.paid_on,
                principal_minor: split.principal_minor,
                interest_minor: split.interest_minor,
                remaining_balance_minor: split.remaining_minor,
                payment_month: month_key(cmd.paid_on),
                from_account_id: source.id,
                movement_id: entry.id,
                created_at: Utc::now(),
            };
            let mut model: debt_payments::ActiveModel = (&payment).into();
            model.user_id = ActiveValue::Set(self.owner.clone());
            model.insert(&db_tx).await?;

            debt.current_amount_minor = split.remaining_minor;
            if split.remaining_minor > 0 && debt.kind == DebtKind::Recurring {
                debt.due_date = next_month(debt.due_date, debt.due_day)?;
                debt.due_month = month_key(debt.due_date);
            }
            debt.status = debt.derive_status(cmd.paid_on);
            let active = debts::ActiveModel {
                id: ActiveValue::Set(debt.id.to_string()),
                current_amount_minor: ActiveValue::Set(debt.current_amount_minor),
                due_date: ActiveValue::Set(debt.due_date),
                due_month: ActiveValue::Set(debt.due_month.clone()),
                status: ActiveValue::Set(debt.status.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            tracing::debug!(
                debt_id = %debt.id,
                account_id = %source.id,
                amount = %Money::new(cmd.amount_minor),
                interest = %Money::new(split.interest_minor),
                principal = %Money::new(split.principal_minor),
                remaining = %Money::new(split.remaining_minor),
                status = debt.status.as_str(),
                "debt payment applied"
            );
            Ok(payment)
        })
    }

    /// Pays the monthly instalment of every eligible auto-pay debt that has
    /// no payment yet this month.
    ///
    /// Each debt is paid in its own transaction; a failure is recorded in the
    /// report and the batch moves on.
    pub async fn run_auto_payments(&self, today: NaiveDate) -> ResultEngine<AutoPayReport> {
        let candidates = debts::Entity::find()
            .filter(debts::Column::UserId.eq(self.owner.as_str()))
            .filter(debts::Column::AutoPay.eq(true))
            .filter(debts::Column::Status.ne(DebtStatus::Paid.as_str()))
            .order_by_asc(debts::Column::DueDate)
            .all(&self.database)
            .await?;

        let month = month_key(today);
        let mut report = AutoPayReport::default();
        for model in candidates {
            let debt = Debt::try_from(model)?;
            // a recurring debt paid this month has already rolled into the next one
            let paid_this_month = debt_payments::Entity::find()
                .filter(debt_payments::Column::DebtId.eq(debt.id.to_string()))
                .filter(debt_payments::Column::PaymentMonth.eq(month.as_str()))
                .count(&self.database)
                .await?;
            if paid_this_month > 0 {
                report.attempts.push((debt.id, AutoPayOutcome::AlreadyPaid));
                continue;
            }
            if debt.eligibility(today).is_err() {
                continue;
            }

            let due = debt
                .current_amount_minor
                .saturating_add(debt.monthly_interest_minor());
            let amount_minor = debt.monthly_payment_minor.min(due);
            let mut cmd = DebtPaymentCmd::new(debt.id, amount_minor, today).note("auto-pay");
            if let Some(account_id) = debt.payment_account_id {
                cmd = cmd.from_account(account_id);
            }
            let outcome = match self.add_payment(cmd).await {
                Ok(payment) => AutoPayOutcome::Paid(payment),
                Err(err) => {
                    tracing::warn!(debt_id = %debt.id, "auto-payment failed: {err}");
                    AutoPayOutcome::Failed(err)
                }
            };
            report.attempts.push((debt.id, outcome));
        }
        Ok(report)
    }

    /// Audit trail of a debt, newest first.
    pub async fn debt_payments(&self, debt_id: Uuid) -> ResultEngine<Vec<DebtPayment>> {
        with_tx!(self, |db_tx| {
            self.require_debt(&db_tx, debt_id).await?;
            debt_payments::Entity::find()
                .filter(debt_payments::Column::DebtId.eq(debt_id.to_string()))
                .order_by_desc(debt_payments::Column::PaymentDate)
                .order_by_desc(debt_payments::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(DebtPayment::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    async fn require_debt(&self, db_tx: &DatabaseTransaction, debt_id: Uuid) -> ResultEngine<Debt> {
        let model = debts::Entity::find_by_id(debt_id.to_string())
            .filter(debts::Column::UserId.eq(self.owner.as_str()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("debt {debt_id}")))?;
        Debt::try_from(model)
    }
}
