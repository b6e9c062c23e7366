//! The module contains the `SavingsGoal` struct and its storage model.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{parse_optional_uuid, parse_uuid},
};

/// A savings goal.
///
/// Money saved for a goal physically lives in a dedicated savings account;
/// `current_amount_minor` tracks how much of it belongs to this goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub name: String,
    pub target_amount_minor: i64,
    pub current_amount_minor: i64,
    pub target_date: Option<NaiveDate>,
    pub monthly_contribution_minor: i64,
    pub category: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_completed: bool,
    pub savings_account_id: Option<Uuid>,
    pub contribution_account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn remaining_minor(&self) -> i64 {
        (self.target_amount_minor - self.current_amount_minor).max(0)
    }

    /// Adds (or with a negative delta, removes) saved money, flooring at zero
    /// and refreshing `is_completed`.
    pub(crate) fn apply_delta(&mut self, delta_minor: i64) -> Result<(), EngineError> {
        let next = self
            .current_amount_minor
            .checked_add(delta_minor)
            .ok_or_else(|| EngineError::InvalidAmount("goal amount overflow".to_string()))?;
        self.current_amount_minor = next.max(0);
        self.refresh_completion();
        Ok(())
    }

    pub(crate) fn refresh_completion(&mut self) {
        self.is_completed = self.current_amount_minor >= self.target_amount_minor;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings_goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_amount_minor: i64,
    pub current_amount_minor: i64,
    pub target_date: Option<Date>,
    pub monthly_contribution_minor: i64,
    pub category: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTimeUtc,
    pub savings_account_id: Option<String>,
    pub contribution_account_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::savings_contributions::Entity")]
    SavingsContributions,
}

impl Related<super::savings_contributions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsContributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SavingsGoal> for ActiveModel {
    fn from(goal: &SavingsGoal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id.to_string()),
            user_id: ActiveValue::NotSet,
            name: ActiveValue::Set(goal.name.clone()),
            target_amount_minor: ActiveValue::Set(goal.target_amount_minor),
            current_amount_minor: ActiveValue::Set(goal.current_amount_minor),
            target_date: ActiveValue::Set(goal.target_date),
            monthly_contribution_minor: ActiveValue::Set(goal.monthly_contribution_minor),
            category: ActiveValue::Set(goal.category.clone()),
            color: ActiveValue::Set(goal.color.clone()),
            icon: ActiveValue::Set(goal.icon.clone()),
            is_completed: ActiveValue::Set(goal.is_completed),
            created_at: ActiveValue::Set(goal.created_at),
            savings_account_id: ActiveValue::Set(goal.savings_account_id.map(|id| id.to_string())),
            contribution_account_id: ActiveValue::Set(
                goal.contribution_account_id.map(|id| id.to_string()),
            ),
        }
    }
}

impl TryFrom<Model> for SavingsGoal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "savings goal")?,
            name: model.name,
            target_amount_minor: model.target_amount_minor,
            current_amount_minor: model.current_amount_minor,
            target_date: model.target_date,
            monthly_contribution_minor: model.monthly_contribution_minor,
            category: model.category,
            color: model.color,
            icon: model.icon,
            is_completed: model.is_completed,
            savings_account_id: parse_optional_uuid(
                model.savings_account_id.as_deref(),
                "savings account",
            )?,
            contribution_account_id: parse_optional_uuid(
                model.contribution_account_id.as_deref(),
                "contribution account",
            )?,
            created_at: model.created_at,
        })
    }
}
