//! Debts and their payment lifecycle.
//!
//! A debt moves through `future → active → overdue` as the calendar crosses
//! its due month, and settles into `paid` once nothing is owed. Payments are
//! only accepted while the due month is the current month.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, PaymentRejection, ResultEngine,
    util::{month_key, parse_optional_uuid, parse_uuid},
};

/// Basis points per percent times months per year.
const MONTHLY_RATE_DIVISOR: i128 = 100 * 100 * 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Future,
    Active,
    Overdue,
    Paid,
}

impl DebtStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Future => "future",
            Self::Active => "active",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for DebtStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "future" => Ok(Self::Future),
            "active" => Ok(Self::Active),
            "overdue" => Ok(Self::Overdue),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid debt status: {other}"
            ))),
        }
    }
}

/// `Recurring` debts roll their due date forward a month after each payment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    #[default]
    Single,
    Recurring,
}

impl DebtKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Recurring => "recurring",
        }
    }
}

impl TryFrom<&str> for DebtKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "recurring" => Ok(Self::Recurring),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid debt type: {other}"
            ))),
        }
    }
}

/// How a payment divides between interest and principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub interest_minor: i64,
    pub principal_minor: i64,
    /// Outstanding amount once the principal is applied, floored at zero.
    pub remaining_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub id: Uuid,
    pub name: String,
    pub creditor: String,
    pub kind: DebtKind,
    pub initial_amount_minor: i64,
    pub current_amount_minor: i64,
    /// Annual rate in basis points (`1200` = 12 %).
    pub interest_rate_bp: i64,
    pub monthly_payment_minor: i64,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub due_month: String,
    /// Day of month recurring debts fall due on. Short months clamp the
    /// due date, not this anchor.
    pub due_day: u32,
    pub status: DebtStatus,
    pub category: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub auto_pay: bool,
    pub payment_account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Debt {
    /// Where the state machine puts this debt on `today`.
    ///
    /// `paid` is terminal: once settled, the debt never leaves it on its own.
    pub fn status_on(&self, today: NaiveDate) -> DebtStatus {
        if self.status == DebtStatus::Paid {
            return DebtStatus::Paid;
        }
        self.derive_status(today)
    }

    /// Status from the outstanding amount and the calendar alone, ignoring a
    /// stored `paid`. Manual edits go through here.
    pub(crate) fn derive_status(&self, today: NaiveDate) -> DebtStatus {
        if self.current_amount_minor <= 0 {
            return DebtStatus::Paid;
        }
        match self.due_month.as_str().cmp(month_key(today).as_str()) {
            Ordering::Equal => DebtStatus::Active,
            Ordering::Greater => DebtStatus::Future,
            Ordering::Less => DebtStatus::Overdue,
        }
    }

    /// A payment is accepted only inside the due month of an unsettled debt.
    pub fn eligibility(&self, today: NaiveDate) -> Result<(), PaymentRejection> {
        match self.status_on(today) {
            DebtStatus::Active => Ok(()),
            DebtStatus::Paid => Err(PaymentRejection::AlreadySettled),
            DebtStatus::Overdue => Err(PaymentRejection::WindowExpired),
            DebtStatus::Future => Err(PaymentRejection::WindowNotOpen),
        }
    }

    /// Simple monthly interest on the outstanding amount, rounded half-up to
    /// the minor unit.
    pub fn monthly_interest_minor(&self) -> i64 {
        if self.current_amount_minor <= 0 || self.interest_rate_bp <= 0 {
            return 0;
        }
        let scaled = i128::from(self.current_amount_minor) * i128::from(self.interest_rate_bp);
        let rounded = (scaled + MONTHLY_RATE_DIVISOR / 2) / MONTHLY_RATE_DIVISOR;
        i64::try_from(rounded).unwrap_or(i64::MAX)
    }

    /// Interest is covered first; whatever is left reduces the principal.
    pub fn split_payment(&self, amount_minor: i64) -> PaymentSplit {
        let monthly_interest = self.monthly_interest_minor();
        let interest_minor = amount_minor.min(monthly_interest);
        let principal_minor = (amount_minor - monthly_interest).max(0);
        let remaining_minor = (self.current_amount_minor - principal_minor).max(0);
        PaymentSplit {
            interest_minor,
            principal_minor,
            remaining_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub creditor: String,
    pub initial_amount_minor: i64,
    pub current_amount_minor: i64,
    pub interest_rate_bp: i64,
    pub monthly_payment_minor: i64,
    pub start_date: Date,
    pub due_date: Date,
    pub due_month: String,
    pub status: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub auto_pay: bool,
    pub payment_account_id: Option<String>,
    pub due_day: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::debt_payments::Entity")]
    DebtPayments,
}

impl Related<super::debt_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DebtPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Debt> for ActiveModel {
    fn from(debt: &Debt) -> Self {
        Self {
            id: ActiveValue::Set(debt.id.to_string()),
            user_id: ActiveValue::NotSet,
            name: ActiveValue::Set(debt.name.clone()),
            creditor: ActiveValue::Set(debt.creditor.clone()),
            initial_amount_minor: ActiveValue::Set(debt.initial_amount_minor),
            current_amount_minor: ActiveValue::Set(debt.current_amount_minor),
            interest_rate_bp: ActiveValue::Set(debt.interest_rate_bp),
            monthly_payment_minor: ActiveValue::Set(debt.monthly_payment_minor),
            start_date: ActiveValue::Set(debt.start_date),
            due_date: ActiveValue::Set(debt.due_date),
            due_month: ActiveValue::Set(debt.due_month.clone()),
            status: ActiveValue::Set(debt.status.as_str().to_string()),
            category: ActiveValue::Set(debt.category.clone()),
            color: ActiveValue::Set(debt.color.clone()),
            notes: ActiveValue::Set(debt.notes.clone()),
            created_at: ActiveValue::Set(debt.created_at),
            kind: ActiveValue::Set(debt.kind.as_str().to_string()),
            auto_pay: ActiveValue::Set(debt.auto_pay),
            payment_account_id: ActiveValue::Set(debt.payment_account_id.map(|id| id.to_string())),
            due_day: ActiveValue::Set(i32::try_from(debt.due_day).unwrap_or(0)),
        }
    }
}

impl TryFrom<Model> for Debt {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let due_day = match u32::try_from(model.due_day) {
            Ok(day @ 1..=31) => day,
            _ => model.due_date.day(),
        };
        Ok(Self {
            id: parse_uuid(&model.id, "debt")?,
            name: model.name,
            creditor: model.creditor,
            kind: DebtKind::try_from(model.kind.as_str())?,
            initial_amount_minor: model.initial_amount_minor,
            current_amount_minor: model.current_amount_minor,
            interest_rate_bp: model.interest_rate_bp,
            monthly_payment_minor: model.monthly_payment_minor,
            start_date: model.start_date,
            due_date: model.due_date,
            due_month: model.due_month,
            due_day,
            status: DebtStatus::try_from(model.status.as_str())?,
            category: model.category,
            color: model.color,
            notes: model.notes,
            auto_pay: model.auto_pay,
            payment_account_id: parse_optional_uuid(
                model.payment_account_id.as_deref(),
                "payment account",
            )?,
            created_at: model.created_at,
        })
    }
}

pub(crate) fn validate_terms(
    initial_amount_minor: i64,
    current_amount_minor: i64,
    interest_rate_bp: i64,
    monthly_payment_minor: i64,
    start_date: NaiveDate,
    due_date: NaiveDate,
) -> ResultEngine<()> {
    if initial_amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "initial amount must be > 0".to_string(),
        ));
    }
    if current_amount_minor < 0 {
        return Err(EngineError::InvalidAmount(
            "current amount must be >= 0".to_string(),
        ));
    }
    if interest_rate_bp < 0 {
        return Err(EngineError::ValidationFailed(
            "interest rate must be >= 0".to_string(),
        ));
    }
    if monthly_payment_minor < 0 {
        return Err(EngineError::InvalidAmount(
            "monthly payment must be >= 0".to_string(),
        ));
    }
    if due_date < start_date {
        return Err(EngineError::ValidationFailed(
            "due date must not precede start date".to_string(),
        ));
    }
    Ok(())
}
