use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    Account, ContributionCmd, EngineError, Money, NewSavingsGoal, ResultEngine, SavingsContribution,
    SavingsGoal, SavingsGoalPatch, SystemCategory, TransferCmd, accounts, savings_contributions,
    savings_goals,
    util::{normalize_optional_text, normalize_required_name, require_positive},
};

use super::{Engine, TransferReceipt, with_tx};

/// What happened to the money when a contribution was deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundOutcome {
    Refunded(TransferReceipt),
    /// The savings account could not cover the refund; the goal was still
    /// decremented.
    Skipped { shortfall_minor: i64 },
    /// The source account was deleted; the money stays in savings.
    SourceGone,
}

fn validate_goal(goal: &SavingsGoal) -> ResultEngine<()> {
    require_positive(goal.target_amount_minor, "target amount")?;
    if goal.monthly_contribution_minor < 0 {
        return Err(EngineError::InvalidAmount(
            "monthly contribution must be >= 0".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    pub async fn create_savings_goal(&self, new: NewSavingsGoal) -> ResultEngine<SavingsGoal> {
        let mut goal = SavingsGoal {
            id: Uuid::new_v4(),
            name: normalize_required_name(&new.name, "goal")?,
            target_amount_minor: new.target_amount_minor,
            current_amount_minor: 0,
            target_date: new.target_date,
            monthly_contribution_minor: new.monthly_contribution_minor,
            category: normalize_optional_text(new.category.as_deref()),
            color: normalize_optional_text(new.color.as_deref()),
            icon: normalize_optional_text(new.icon.as_deref()),
            is_completed: false,
            savings_account_id: new.savings_account_id,
            contribution_account_id: new.contribution_account_id,
            created_at: Utc::now(),
        };
        validate_goal(&goal)?;
        goal.refresh_completion();
        with_tx!(self, |db_tx| {
            for account_id in [goal.savings_account_id, goal.contribution_account_id]
                .into_iter()
                .flatten()
            {
                self.require_account(&db_tx, account_id).await?;
            }
            let mut model: savings_goals::ActiveModel = (&goal).into();
            model.user_id = ActiveValue::Set(self.owner.clone());
            model.insert(&db_tx).await?;
            Ok(goal)
        })
    }

    pub async fn savings_goal(&self, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        with_tx!(self, |db_tx| self.require_goal(&db_tx, goal_id).await)
    }

    pub async fn list_savings_goals(&self) -> ResultEngine<Vec<SavingsGoal>> {
        savings_goals::Entity::find()
            .filter(savings_goals::Column::UserId.eq(self.owner.as_str()))
            .order_by_asc(savings_goals::Column::CreatedAt)
            .order_by_asc(savings_goals::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(SavingsGoal::try_from)
            .collect()
    }

    pub async fn update_savings_goal(
        &self,
        goal_id: Uuid,
        patch: SavingsGoalPatch,
    ) -> ResultEngine<SavingsGoal> {
        with_tx!(self, |db_tx| {
            let mut goal = self.require_goal(&db_tx, goal_id).await?;
            if let Some(name) = patch.name.as_deref() {
                goal.name = normalize_required_name(name, "goal")?;
            }
            if let Some(target) = patch.target_amount_minor {
                goal.target_amount_minor = target;
            }
            if let Some(target_date) = patch.target_date {
                goal.target_date = Some(target_date);
            }
            if let Some(monthly) = patch.monthly_contribution_minor {
                goal.monthly_contribution_minor = monthly;
            }
            if let Some(account_id) = patch.savings_account_id {
                self.require_account(&db_tx, account_id).await?;
                goal.savings_account_id = Some(account_id);
            }
            if let Some(account_id) = patch.contribution_account_id {
                self.require_account(&db_tx, account_id).await?;
                goal.contribution_account_id = Some(account_id);
            }
            validate_goal(&goal)?;
            goal.refresh_completion();

            let model: savings_goals::ActiveModel = (&goal).into();
            model.update(&db_tx).await?;
            Ok(goal)
        })
    }

    /// Deletes a goal.
    ///
    /// With `refund`, every contribution first goes through the refund flow
    /// dated `date`; without it the goal must have no contributions left.
    pub async fn delete_savings_goal(
        &self,
        goal_id: Uuid,
        refund: bool,
        date: NaiveDate,
    ) -> ResultEngine<Vec<RefundOutcome>> {
        with_tx!(self, |db_tx| {
            let mut goal = self.require_goal(&db_tx, goal_id).await?;
            let contributions = self.goal_contributions(&db_tx, goal_id).await?;
            if !contributions.is_empty() && !refund {
                return Err(EngineError::ValidationFailed(format!(
                    "goal '{}' still has {} contribution(s)",
                    goal.name,
                    contributions.len()
                )));
            }

            let mut outcomes = Vec::with_capacity(contributions.len());
            for contribution in &contributions {
                outcomes.push(
                    self.refund_contribution(&db_tx, &mut goal, contribution, date)
                        .await?,
                );
            }
            savings_goals::Entity::delete_by_id(goal.id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(outcomes)
        })
    }

    /// Moves money from a source account into the goal's savings account and
    /// books it on the goal.
    ///
    /// The savings account is the goal's own, else the strategy's pick, which
    /// is then stored on the goal. The source is the explicit account, else
    /// the goal's contribution account, else the strategy's pick.
    pub async fn add_contribution(&self, cmd: ContributionCmd) -> ResultEngine<SavingsContribution> {
        require_positive(cmd.amount_minor, "contribution amount")?;
        with_tx!(self, |db_tx| {
            let mut goal = self.require_goal(&db_tx, cmd.goal_id).await?;

            let savings_account = match goal.savings_account_id {
                Some(account_id) => {
                    Account::try_from(self.require_account(&db_tx, account_id).await?)?
                }
                None => {
                    let account = self.resolve_savings_account(&db_tx).await?;
                    goal.savings_account_id = Some(account.id);
                    account
                }
            };
            let source_id = match cmd.from_account_id.or(goal.contribution_account_id) {
                Some(account_id) => account_id,
                None => {
                    self.resolve_funding_source(
                        &db_tx,
                        cmd.amount_minor,
                        Some(savings_account.id),
                        Some(savings_account.currency),
                    )
                    .await?
                    .id
                }
            };
            if source_id == savings_account.id {
                return Err(EngineError::ValidationFailed(
                    "contribution source must differ from the savings account".to_string(),
                ));
            }

            let transfer = TransferCmd::new(source_id, savings_account.id, cmd.amount_minor, cmd.date)
                .category(SystemCategory::Savings)
                .description(format!("contribution to '{}'", goal.name));
            self.transfer_in_tx(&db_tx, &transfer).await?;

            let contribution = SavingsContribution {
                id: Uuid::new_v4(),
                goal_id: goal.id,
                amount_minor: cmd.amount_minor,
                date: cmd.date,
                from_account_id: source_id,
                created_at: Utc::now(),
            };
            let mut model: savings_contributions::ActiveModel = (&contribution).into();
            model.user_id = ActiveValue::Set(self.owner.clone());
            model.insert(&db_tx).await?;

            goal.apply_delta(cmd.amount_minor)?;
            let goal_model: savings_goals::ActiveModel = (&goal).into();
            goal_model.update(&db_tx).await?;

            tracing::debug!(
                goal_id = %goal.id,
                amount = %Money::new(cmd.amount_minor),
                current = %Money::new(goal.current_amount_minor),
                completed = goal.is_completed,
                "savings contribution applied"
            );
            Ok(contribution)
        })
    }

    /// Deletes a contribution and sends its money back to the source account.
    ///
    /// When the savings account cannot cover the refund, or the source account
    /// has since been deleted, the money stays put, a warning is logged and
    /// the deletion still goes through.
    pub async fn delete_contribution_with_refund(
        &self,
        contribution_id: Uuid,
        date: NaiveDate,
    ) -> ResultEngine<RefundOutcome> {
        with_tx!(self, |db_tx| {
            let contribution = self.require_contribution(&db_tx, contribution_id).await?;
            let mut goal = self.require_goal(&db_tx, contribution.goal_id).await?;
            let outcome = self
                .refund_contribution(&db_tx, &mut goal, &contribution, date)
                .await?;
            let goal_model: savings_goals::ActiveModel = (&goal).into();
            goal_model.update(&db_tx).await?;
            Ok(outcome)
        })
    }

    /// Contributions of a goal, newest first.
    pub async fn contributions(&self, goal_id: Uuid) -> ResultEngine<Vec<SavingsContribution>> {
        with_tx!(self, |db_tx| {
            self.require_goal(&db_tx, goal_id).await?;
            self.goal_contributions(&db_tx, goal_id).await
        })
    }

    /// Refund, goal decrement and row deletion for one contribution. The
    /// caller persists `goal`.
    async fn refund_contribution(
        &self,
        db_tx: &DatabaseTransaction,
        goal: &mut SavingsGoal,
        contribution: &SavingsContribution,
        date: NaiveDate,
    ) -> ResultEngine<RefundOutcome> {
        let available = match goal.savings_account_id {
            Some(account_id) => self.require_account(db_tx, account_id).await?.balance_minor,
            None => 0,
        };
        let source_exists = accounts::Entity::find_by_id(contribution.from_account_id.to_string())
            .filter(accounts::Column::UserId.eq(self.owner.as_str()))
            .count(db_tx)
            .await?
            > 0;

        let outcome = match goal.savings_account_id {
            _ if !source_exists => {
                tracing::warn!(
                    contribution_id = %contribution.id,
                    goal_id = %goal.id,
                    from_account_id = %contribution.from_account_id,
                    "savings refund skipped: source account no longer exists"
                );
                RefundOutcome::SourceGone
            }
            Some(savings_id) if available >= contribution.amount_minor => {
                let transfer = TransferCmd::new(
                    savings_id,
                    contribution.from_account_id,
                    contribution.amount_minor,
                    date,
                )
                .category(SystemCategory::SavingsRefund)
                .description(format!("refund from '{}'", goal.name));
                RefundOutcome::Refunded(self.transfer_in_tx(db_tx, &transfer).await?)
            }
            _ => {
                let shortfall_minor = contribution.amount_minor - available.max(0);
                tracing::warn!(
                    contribution_id = %contribution.id,
                    goal_id = %goal.id,
                    amount = %Money::new(contribution.amount_minor),
                    available = %Money::new(available),
                    "savings refund skipped: insufficient funds in savings account"
                );
                RefundOutcome::Skipped { shortfall_minor }
            }
        };

        goal.apply_delta(-contribution.amount_minor)?;
        savings_contributions::Entity::delete_by_id(contribution.id.to_string())
            .exec(db_tx)
            .await?;
        Ok(outcome)
    }

    async fn goal_contributions(
        &self,
        db_tx: &DatabaseTransaction,
        goal_id: Uuid,
    ) -> ResultEngine<Vec<SavingsContribution>> {
        savings_contributions::Entity::find()
            .filter(savings_contributions::Column::GoalId.eq(goal_id.to_string()))
            .order_by_desc(savings_contributions::Column::Date)
            .order_by_desc(savings_contributions::Column::CreatedAt)
            .all(db_tx)
            .await?
            .into_iter()
            .map(SavingsContribution::try_from)
            .collect()
    }

    async fn require_goal(
        &self,
        db_tx: &DatabaseTransaction,
        goal_id: Uuid,
    ) -> ResultEngine<SavingsGoal> {
        let model = savings_goals::Entity::find_by_id(goal_id.to_string())
            .filter(savings_goals::Column::UserId.eq(self.owner.as_str()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("savings goal {goal_id}")))?;
        SavingsGoal::try_from(model)
    }

    async fn require_contribution(
        &self,
        db_tx: &DatabaseTransaction,
        contribution_id: Uuid,
    ) -> ResultEngine<SavingsContribution> {
        let model = savings_contributions::Entity::find_by_id(contribution_id.to_string())
            .filter(savings_contributions::Column::UserId.eq(self.owner.as_str()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("contribution {contribution_id}")))?;
        SavingsContribution::try_from(model)
    }
}
