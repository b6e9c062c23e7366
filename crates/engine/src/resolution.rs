//! Account auto-resolution.
//!
//! When a caller does not name an account, the engine asks an
//! [`AccountResolutionStrategy`] to pick one. Candidates are always active
//! accounts of the engine owner, ordered by creation time; the strategy only
//! chooses among them and never touches the store.

use core::fmt;

use crate::{Account, AccountKind};

pub trait AccountResolutionStrategy: fmt::Debug + Send + Sync {
    /// Pick the account that pays `amount_minor` out.
    fn funding_source<'a>(
        &self,
        candidates: &'a [Account],
        amount_minor: i64,
    ) -> Option<&'a Account>;

    /// Pick the account that holds a goal's savings.
    fn savings_account<'a>(&self, candidates: &'a [Account]) -> Option<&'a Account>;
}

/// Takes the first candidate that qualifies: enough balance for a funding
/// source, kind `savings` for a savings account.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstFit;

impl AccountResolutionStrategy for FirstFit {
    fn funding_source<'a>(
        &self,
        candidates: &'a [Account],
        amount_minor: i64,
    ) -> Option<&'a Account> {
        candidates.iter().find(|a| a.can_cover(amount_minor))
    }

    fn savings_account<'a>(&self, candidates: &'a [Account]) -> Option<&'a Account> {
        candidates.iter().find(|a| a.kind == AccountKind::Savings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Currency;

    fn account(name: &str, kind: AccountKind, balance_minor: i64) -> Account {
        let mut account = Account::new(name.to_string(), kind, Currency::Eur);
        account.balance_minor = balance_minor;
        account
    }

    #[test]
    fn funding_source_skips_accounts_that_cannot_cover() {
        let candidates = vec![
            account("Cash", AccountKind::Cash, 1_000),
            account("Bank", AccountKind::Bank, 50_000),
            account("Card", AccountKind::Card, 90_000),
        ];
        let picked = FirstFit.funding_source(&candidates, 20_000).unwrap();
        assert_eq!(picked.name, "Bank");
        assert!(FirstFit.funding_source(&candidates, 100_000).is_none());
    }

    #[test]
    fn savings_account_is_first_of_kind_savings() {
        let candidates = vec![
            account("Bank", AccountKind::Bank, 0),
            account("Pot A", AccountKind::Savings, 0),
            account("Pot B", AccountKind::Savings, 0),
        ];
        assert_eq!(FirstFit.savings_account(&candidates).unwrap().name, "Pot A");
        assert!(FirstFit.savings_account(&candidates[..1]).is_none());
    }
}
