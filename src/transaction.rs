use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    account::AccountNumber,
    command::{TransactionIntent, TransactionKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for TransactionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Executed movement of money. Never modified once stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub created_at: DateTime<Utc>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub account_from: Option<AccountNumber>,
    pub account_to: Option<AccountNumber>,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        amount: Decimal,
        account_from: Option<AccountNumber>,
        account_to: Option<AccountNumber>,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            created_at: Utc::now(),
            kind,
            amount,
            account_from,
            account_to,
        }
    }

    pub fn from_intent(intent: &TransactionIntent) -> Self {
        Self::new(
            intent.kind,
            intent.amount,
            intent.account_from,
            intent.account_to,
        )
    }
}
