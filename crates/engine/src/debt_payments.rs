//! Append-only audit trail of debt payments.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Every stored payment has settled; the column exists for rows imported
/// from elsewhere.
const PAYMENT_STATUS_COMPLETED: &str = "completed";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtPayment {
    pub id: Uuid,
    pub debt_id: Uuid,
    pub amount_minor: i64,
    pub payment_date: NaiveDate,
    pub principal_minor: i64,
    pub interest_minor: i64,
    pub remaining_balance_minor: i64,
    pub payment_month: String,
    pub from_account_id: Uuid,
    /// Movement entry that debited `from_account_id`.
    pub movement_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "debt_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub debt_id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub payment_date: Date,
    pub payment_status: String,
    pub created_at: DateTimeUtc,
    pub from_account_id: String,
    pub principal_minor: i64,
    pub interest_minor: i64,
    pub remaining_balance_minor: i64,
    pub payment_month: String,
    pub movement_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::debts::Entity",
        from = "Column::DebtId",
        to = "super::debts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Debts,
}

impl Related<super::debts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&DebtPayment> for ActiveModel {
    fn from(payment: &DebtPayment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            debt_id: ActiveValue::Set(payment.debt_id.to_string()),
            user_id: ActiveValue::NotSet,
            amount_minor: ActiveValue::Set(payment.amount_minor),
            payment_date: ActiveValue::Set(payment.payment_date),
            payment_status: ActiveValue::Set(PAYMENT_STATUS_COMPLETED.to_string()),
            created_at: ActiveValue::Set(payment.created_at),
            from_account_id: ActiveValue::Set(payment.from_account_id.to_string()),
            principal_minor: ActiveValue::Set(payment.principal_minor),
            interest_minor: ActiveValue::Set(payment.interest_minor),
            remaining_balance_minor: ActiveValue::Set(payment.remaining_balance_minor),
            payment_month: ActiveValue::Set(payment.payment_month.clone()),
            movement_id: ActiveValue::Set(payment.movement_id.to_string()),
        }
    }
}

impl TryFrom<Model> for DebtPayment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "debt payment")?,
            debt_id: parse_uuid(&model.debt_id, "debt")?,
            amount_minor: model.amount_minor,
            payment_date: model.payment_date,
            principal_minor: model.principal_minor,
            interest_minor: model.interest_minor,
            remaining_balance_minor: model.remaining_balance_minor,
            payment_month: model.payment_month,
            from_account_id: parse_uuid(&model.from_account_id, "account")?,
            movement_id: parse_uuid(&model.movement_id, "movement")?,
            created_at: model.created_at,
        })
    }
}
