//! Personal-finance ledger engine.
//!
//! Accounts hold money, the movement log records every signed change to an
//! account, and debts and savings goals move money through the same transfer
//! primitive. Every money-moving operation runs inside one database
//! transaction so its writes land together or not at all.

pub use accounts::{Account, AccountKind};
pub use categories::{Category, SystemCategory};
pub use commands::{
    AccountFilter, AccountPatch, ContributionCmd, DateRange, DebtPatch, DebtPaymentCmd, NewAccount,
    NewDebt, NewMovement, NewSavingsGoal, SavingsGoalPatch, TransferCmd,
};
pub use currency::Currency;
pub use debt_payments::DebtPayment;
pub use debts::{Debt, DebtKind, DebtStatus, PaymentSplit};
pub use error::{EngineError, PaymentRejection};
pub use money::Money;
pub use ops::{
    AutoPayOutcome, AutoPayReport, BalanceCorrection, Engine, EngineBuilder, ReconcileReport,
    RefundOutcome, TransferReceipt,
};
pub use resolution::{AccountResolutionStrategy, FirstFit};
pub use savings_contributions::SavingsContribution;
pub use savings_goals::SavingsGoal;
pub use transactions::{MovementEntry, MovementKind, Recurrence};
pub use util::month_key;

mod accounts;
mod categories;
mod commands;
mod currency;
mod debt_payments;
mod debts;
mod error;
mod money;
mod ops;
mod resolution;
mod savings_contributions;
mod savings_goals;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
