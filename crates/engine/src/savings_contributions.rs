//! Contributions towards a savings goal.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsContribution {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub amount_minor: i64,
    pub date: NaiveDate,
    /// Account the money came from, and where a refund returns it.
    pub from_account_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings_contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub goal_id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub date: Date,
    pub created_at: DateTimeUtc,
    pub from_account_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::savings_goals::Entity",
        from = "Column::GoalId",
        to = "super::savings_goals::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    SavingsGoals,
}

impl Related<super::savings_goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavingsGoals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SavingsContribution> for ActiveModel {
    fn from(contribution: &SavingsContribution) -> Self {
        Self {
            id: ActiveValue::Set(contribution.id.to_string()),
            goal_id: ActiveValue::Set(contribution.goal_id.to_string()),
            user_id: ActiveValue::NotSet,
            amount_minor: ActiveValue::Set(contribution.amount_minor),
            date: ActiveValue::Set(contribution.date),
            created_at: ActiveValue::Set(contribution.created_at),
            from_account_id: ActiveValue::Set(contribution.from_account_id.to_string()),
        }
    }
}

impl TryFrom<Model> for SavingsContribution {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "contribution")?,
            goal_id: parse_uuid(&model.goal_id, "savings goal")?,
            amount_minor: model.amount_minor,
            date: model.date,
            from_account_id: parse_uuid(&model.from_account_id, "account")?,
            created_at: model.created_at,
        })
    }
}
