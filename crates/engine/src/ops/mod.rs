use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{Account, AccountResolutionStrategy, Currency, EngineError, FirstFit, ResultEngine};

mod accounts;
mod balances;
mod debts;
mod movements;
mod savings;
mod transfers;

pub use balances::{BalanceCorrection, ReconcileReport};
pub use debts::{AutoPayOutcome, AutoPayReport};
pub use savings::RefundOutcome;
pub use transfers::TransferReceipt;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const DEFAULT_OWNER: &str = "local";

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    /// Every row the engine writes or reads is scoped to this owner.
    owner: String,
    resolution: Arc<dyn AccountResolutionStrategy>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Loads an account of this owner, failing with `NotFound` otherwise.
    pub(crate) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<crate::accounts::Model> {
        crate::accounts::Entity::find_by_id(account_id.to_string())
            .filter(crate::accounts::Column::UserId.eq(self.owner.as_str()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account {account_id}")))
    }

    /// Active accounts of this owner, oldest first: the candidates handed to
    /// the resolution strategy.
    pub(crate) async fn active_accounts(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<Vec<Account>> {
        crate::accounts::Entity::find()
            .filter(crate::accounts::Column::UserId.eq(self.owner.as_str()))
            .filter(crate::accounts::Column::IsActive.eq(true))
            .order_by_asc(crate::accounts::Column::CreatedAt)
            .order_by_asc(crate::accounts::Column::Id)
            .all(db_tx)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Ask the strategy for an account able to pay `amount_minor`. `exclude`
    /// keeps the receiving side of a transfer out of the candidates and
    /// `currency`, when set, drops accounts the transfer would reject.
    pub(crate) async fn resolve_funding_source(
        &self,
        db_tx: &DatabaseTransaction,
        amount_minor: i64,
        exclude: Option<Uuid>,
        currency: Option<Currency>,
    ) -> ResultEngine<Account> {
        let mut candidates = self.active_accounts(db_tx).await?;
        candidates.retain(|account| {
            Some(account.id) != exclude && currency.is_none_or(|c| account.currency == c)
        });
        self.resolution
            .funding_source(&candidates, amount_minor)
            .cloned()
            .ok_or_else(|| {
                EngineError::InsufficientFunds(format!(
                    "no active account can cover {amount_minor}"
                ))
            })
    }

    pub(crate) async fn resolve_savings_account(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<Account> {
        let candidates = self.active_accounts(db_tx).await?;
        self.resolution
            .savings_account(&candidates)
            .cloned()
            .ok_or_else(|| EngineError::NotFound("active savings account".to_string()))
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    owner: Option<String>,
    resolution: Option<Arc<dyn AccountResolutionStrategy>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Scope the engine to one owner. Defaults to `"local"`.
    pub fn owner(mut self, owner: impl Into<String>) -> EngineBuilder {
        self.owner = Some(owner.into());
        self
    }

    /// Replace the default [`FirstFit`] account resolution.
    pub fn resolution(
        mut self,
        strategy: impl AccountResolutionStrategy + 'static,
    ) -> EngineBuilder {
        self.resolution = Some(Arc::new(strategy));
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let owner = self.owner.unwrap_or_else(|| DEFAULT_OWNER.to_string());
        let owner = owner.trim().to_string();
        if owner.is_empty() {
            return Err(EngineError::ValidationFailed(
                "owner must not be empty".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            owner,
            resolution: self.resolution.unwrap_or_else(|| Arc::new(FirstFit)),
        })
    }
}
