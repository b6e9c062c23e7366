//! Movement categories.
//!
//! A handful of tags drive business rules: money the engine moves on the
//! user's behalf (transfers, savings, debt payments, opening balances) must be
//! excluded from income/expense aggregations. Those tags are a closed
//! [`SystemCategory`] so a mistyped label can never be confused with one.
//! Everything else is a free-form [`Category::User`] label.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemCategory {
    Transfer,
    Savings,
    SavingsRefund,
    DebtPayment,
    OpeningBalance,
}

impl SystemCategory {
    pub const ALL: [SystemCategory; 5] = [
        Self::Transfer,
        Self::Savings,
        Self::SavingsRefund,
        Self::DebtPayment,
        Self::OpeningBalance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Savings => "savings",
            Self::SavingsRefund => "savings_refund",
            Self::DebtPayment => "debt_payment",
            Self::OpeningBalance => "opening_balance",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
    System(SystemCategory),
    User(String),
}

impl Category {
    /// Parses a stored or user-supplied label.
    ///
    /// Labels are trimmed and compared case-insensitively against the system
    /// tags, so `" Transfer "` is the system transfer tag and never a user
    /// label.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match SystemCategory::parse(&trimmed.to_ascii_lowercase()) {
            Some(system) => Self::System(system),
            None => Self::User(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::System(system) => system.as_str(),
            Self::User(label) => label.as_str(),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    /// Whether reporting collaborators should include the movement in
    /// income/expense totals.
    pub fn counts_in_aggregates(&self) -> bool {
        !self.is_system()
    }
}

impl From<SystemCategory> for Category {
    fn from(value: SystemCategory) -> Self {
        Self::System(value)
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
