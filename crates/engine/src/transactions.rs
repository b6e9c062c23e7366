//! Movement log primitives.
//!
//! A [`MovementEntry`] is one signed monetary event tied to exactly one
//! account. The table keeps the historical `transactions` name.
//!
//! Amounts are stored as signed integer minor units:
//! - positive values are income legs
//! - negative values are expense legs
//!
//! The sign always agrees with [`MovementKind`]; the log is the source of truth
//! from which account balances can be rederived.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid, require_positive},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Income,
    Expense,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Apply this kind's sign to a positive amount.
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Income => amount_minor,
            Self::Expense => -amount_minor,
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid movement kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for Recurrence {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid recurrence: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: MovementKind,
    /// Signed amount: `> 0` for income, `< 0` for expense.
    pub amount_minor: i64,
    pub category: Category,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub recurrence: Option<Recurrence>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl MovementEntry {
    /// Builds an entry from an unsigned `amount_minor`; the stored amount takes
    /// the sign of `kind`.
    pub fn new(
        account_id: Uuid,
        kind: MovementKind,
        amount_minor: i64,
        category: Category,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        require_positive(amount_minor, "amount_minor")?;
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount_minor: kind.signed(amount_minor),
            category,
            description: None,
            date,
            recurrence: None,
            parent_id: None,
            created_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub amount_minor: i64,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub category: String,
    pub account_id: String,
    pub description: Option<String>,
    pub date: Date,
    pub created_at: DateTimeUtc,
    pub recurrence: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MovementEntry> for ActiveModel {
    fn from(entry: &MovementEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            user_id: ActiveValue::NotSet,
            amount_minor: ActiveValue::Set(entry.amount_minor),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            category: ActiveValue::Set(entry.category.as_str().to_string()),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            description: ActiveValue::Set(entry.description.clone()),
            date: ActiveValue::Set(entry.date),
            created_at: ActiveValue::Set(entry.created_at),
            recurrence: ActiveValue::Set(entry.recurrence.map(|r| r.as_str().to_string())),
            parent_id: ActiveValue::Set(entry.parent_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for MovementEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "movement")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            kind: MovementKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            category: Category::parse(&model.category),
            description: model.description,
            date: model.date,
            recurrence: model
                .recurrence
                .as_deref()
                .map(Recurrence::try_from)
                .transpose()?,
            parent_id: parse_optional_uuid(model.parent_id.as_deref(), "parent movement")?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemCategory;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn amount_takes_the_sign_of_the_kind() {
        let account_id = Uuid::new_v4();
        let expense = MovementEntry::new(
            account_id,
            MovementKind::Expense,
            300,
            SystemCategory::Transfer.into(),
            date(),
        )
        .unwrap();
        let income = MovementEntry::new(
            account_id,
            MovementKind::Income,
            300,
            Category::parse("salary"),
            date(),
        )
        .unwrap();

        assert_eq!(expense.amount_minor, -300);
        assert_eq!(income.amount_minor, 300);
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let err = MovementEntry::new(
            Uuid::new_v4(),
            MovementKind::Income,
            0,
            Category::parse("salary"),
            date(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must be > 0".to_string())
        );
    }
}
