//! Command structs for engine operations.
//!
//! These types group parameters for create/update/money-movement operations,
//! keeping call sites readable and avoiding long argument lists. Optional
//! fields are set through chained builder methods.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    AccountKind, Category, Currency, DebtKind, MovementKind, Recurrence, SystemCategory,
};

/// Create an account.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub currency: Currency,
    /// Seeded through an `opening_balance` movement when non-zero.
    pub opening_balance_minor: i64,
    pub opening_date: Option<NaiveDate>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewAccount {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AccountKind, currency: Currency) -> Self {
        Self {
            name: name.into(),
            kind,
            currency,
            opening_balance_minor: 0,
            opening_date: None,
            color: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn opening_balance(mut self, balance_minor: i64, date: NaiveDate) -> Self {
        self.opening_balance_minor = balance_minor;
        self.opening_date = Some(date);
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Partial account update. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub currency: Option<Currency>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

impl AccountPatch {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// Filters for listing accounts.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccountFilter {
    pub kind: Option<AccountKind>,
    pub active_only: bool,
}

/// Inclusive date bounds; a missing bound is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Append a movement to the log.
#[derive(Clone, Debug)]
pub struct NewMovement {
    pub account_id: Uuid,
    pub kind: MovementKind,
    /// Unsigned; the stored amount takes the sign of `kind`.
    pub amount_minor: i64,
    pub category: Category,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub recurrence: Option<Recurrence>,
    pub parent_id: Option<Uuid>,
}

impl NewMovement {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        kind: MovementKind,
        amount_minor: i64,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        Self {
            account_id,
            kind,
            amount_minor,
            category,
            description: None,
            date,
            recurrence: None,
            parent_id: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn recurrence(mut self, recurrence: Recurrence, parent_id: Option<Uuid>) -> Self {
        self.recurrence = Some(recurrence);
        self.parent_id = parent_id;
        self
    }
}

/// Move money between two accounts.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub category: Category,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_minor: i64,
        date: NaiveDate,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount_minor,
            description: None,
            date,
            category: SystemCategory::Transfer.into(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<Category>) -> Self {
        self.category = category.into();
        self
    }
}

/// Register a debt.
#[derive(Clone, Debug)]
pub struct NewDebt {
    pub name: String,
    pub creditor: String,
    pub kind: DebtKind,
    pub initial_amount_minor: i64,
    /// Defaults to `initial_amount_minor`.
    pub current_amount_minor: Option<i64>,
    pub interest_rate_bp: i64,
    pub monthly_payment_minor: i64,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub category: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub auto_pay: bool,
    pub payment_account_id: Option<Uuid>,
}

impl NewDebt {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        creditor: impl Into<String>,
        initial_amount_minor: i64,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            creditor: creditor.into(),
            kind: DebtKind::Single,
            initial_amount_minor,
            current_amount_minor: None,
            interest_rate_bp: 0,
            monthly_payment_minor: 0,
            start_date,
            due_date,
            category: None,
            color: None,
            notes: None,
            auto_pay: false,
            payment_account_id: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: DebtKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn current_amount(mut self, current_amount_minor: i64) -> Self {
        self.current_amount_minor = Some(current_amount_minor);
        self
    }

    #[must_use]
    pub fn interest_rate_bp(mut self, interest_rate_bp: i64) -> Self {
        self.interest_rate_bp = interest_rate_bp;
        self
    }

    #[must_use]
    pub fn monthly_payment(mut self, monthly_payment_minor: i64) -> Self {
        self.monthly_payment_minor = monthly_payment_minor;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn auto_pay(mut self, payment_account_id: Option<Uuid>) -> Self {
        self.auto_pay = true;
        self.payment_account_id = payment_account_id;
        self
    }

    #[must_use]
    pub fn payment_account(mut self, payment_account_id: Uuid) -> Self {
        self.payment_account_id = Some(payment_account_id);
        self
    }
}

/// Manual debt edit. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct DebtPatch {
    pub name: Option<String>,
    pub creditor: Option<String>,
    pub kind: Option<DebtKind>,
    pub current_amount_minor: Option<i64>,
    pub interest_rate_bp: Option<i64>,
    pub monthly_payment_minor: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub auto_pay: Option<bool>,
    /// `Some(None)` clears the payment account.
    pub payment_account_id: Option<Option<Uuid>>,
}

impl DebtPatch {
    #[must_use]
    pub fn current_amount(mut self, current_amount_minor: i64) -> Self {
        self.current_amount_minor = Some(current_amount_minor);
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn payment_account(mut self, payment_account_id: Option<Uuid>) -> Self {
        self.payment_account_id = Some(payment_account_id);
        self
    }
}

/// Pay towards a debt.
#[derive(Clone, Debug)]
pub struct DebtPaymentCmd {
    pub debt_id: Uuid,
    pub amount_minor: i64,
    pub from_account_id: Option<Uuid>,
    /// Payment date; also the "today" the eligibility window is checked on.
    pub paid_on: NaiveDate,
    pub note: Option<String>,
}

impl DebtPaymentCmd {
    #[must_use]
    pub fn new(debt_id: Uuid, amount_minor: i64, paid_on: NaiveDate) -> Self {
        Self {
            debt_id,
            amount_minor,
            from_account_id: None,
            paid_on,
            note: None,
        }
    }

    #[must_use]
    pub fn from_account(mut self, account_id: Uuid) -> Self {
        self.from_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Create a savings goal.
#[derive(Clone, Debug)]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amount_minor: i64,
    pub target_date: Option<NaiveDate>,
    pub monthly_contribution_minor: i64,
    pub category: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub savings_account_id: Option<Uuid>,
    pub contribution_account_id: Option<Uuid>,
}

impl NewSavingsGoal {
    #[must_use]
    pub fn new(name: impl Into<String>, target_amount_minor: i64) -> Self {
        Self {
            name: name.into(),
            target_amount_minor,
            target_date: None,
            monthly_contribution_minor: 0,
            category: None,
            color: None,
            icon: None,
            savings_account_id: None,
            contribution_account_id: None,
        }
    }

    #[must_use]
    pub fn target_date(mut self, target_date: NaiveDate) -> Self {
        self.target_date = Some(target_date);
        self
    }

    #[must_use]
    pub fn monthly_contribution(mut self, monthly_contribution_minor: i64) -> Self {
        self.monthly_contribution_minor = monthly_contribution_minor;
        self
    }

    #[must_use]
    pub fn savings_account(mut self, account_id: Uuid) -> Self {
        self.savings_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn contribution_account(mut self, account_id: Uuid) -> Self {
        self.contribution_account_id = Some(account_id);
        self
    }
}

/// Partial goal update. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct SavingsGoalPatch {
    pub name: Option<String>,
    pub target_amount_minor: Option<i64>,
    pub target_date: Option<NaiveDate>,
    pub monthly_contribution_minor: Option<i64>,
    pub savings_account_id: Option<Uuid>,
    pub contribution_account_id: Option<Uuid>,
}

impl SavingsGoalPatch {
    #[must_use]
    pub fn target_amount(mut self, target_amount_minor: i64) -> Self {
        self.target_amount_minor = Some(target_amount_minor);
        self
    }
}

/// Contribute to a savings goal.
#[derive(Clone, Debug)]
pub struct ContributionCmd {
    pub goal_id: Uuid,
    pub amount_minor: i64,
    pub from_account_id: Option<Uuid>,
    pub date: NaiveDate,
}

impl ContributionCmd {
    #[must_use]
    pub fn new(goal_id: Uuid, amount_minor: i64, date: NaiveDate) -> Self {
        Self {
            goal_id,
            amount_minor,
            from_account_id: None,
            date,
        }
    }

    #[must_use]
    pub fn from_account(mut self, account_id: Uuid) -> Self {
        self.from_account_id = Some(account_id);
        self
    }
}
