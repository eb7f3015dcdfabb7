use std::fmt;

use rust_decimal::Decimal;

use crate::account::AccountNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Transfer => "TRANSFER",
        })
    }
}

/// Request to move money, as handed over by the presentation layer.
///
/// Deposits and withdrawals name the client's own account in `account_from`;
/// transfers additionally name the credited account in `account_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub account_from: Option<AccountNumber>,
    pub account_to: Option<AccountNumber>,
}

impl TransactionIntent {
    pub fn deposit(account: AccountNumber, amount: Decimal) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            amount,
            account_from: Some(account),
            account_to: None,
        }
    }

    pub fn withdrawal(account: AccountNumber, amount: Decimal) -> Self {
        Self {
            kind: TransactionKind::Withdrawal,
            amount,
            account_from: Some(account),
            account_to: None,
        }
    }

    pub fn transfer(from: AccountNumber, to: AccountNumber, amount: Decimal) -> Self {
        Self {
            kind: TransactionKind::Transfer,
            amount,
            account_from: Some(from),
            account_to: Some(to),
        }
    }
}
