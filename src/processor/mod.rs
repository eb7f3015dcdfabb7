use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    account::{AccountNumber, ClientId, Currency},
    balance::BalanceError,
    command::TransactionKind,
    storage::StorageError,
    transaction::TransactionId,
};

pub mod account_locks;
pub mod engine;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Amount must be greater than zero, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("Insufficient funds: balance {balance} is less than {amount}")]
    InsufficientFunds { balance: Decimal, amount: Decimal },
    #[error("Balance overflow when adding {amount} to {balance}")]
    BalanceOverflow { balance: Decimal, amount: Decimal },
    #[error("Accounts must be in the same currency, got {from} and {to}")]
    CurrencyMismatch { from: Currency, to: Currency },
    #[error("Account origin and destination must be different ({0})")]
    SameAccount(AccountNumber),
    #[error("Client {client} is not holder or co-holder of account {account}")]
    NotAuthorized {
        client: ClientId,
        account: AccountNumber,
    },
    #[error("Account {0} not found")]
    AccountNotFound(AccountNumber),
    #[error("Client {0} not found")]
    ClientNotFound(ClientId),
    #[error("Account {0} is locked")]
    AccountLocked(AccountNumber),
    #[error("Source account is required for {kind}")]
    MissingSourceAccount { kind: TransactionKind },
    #[error("Destination account is required for TRANSFER")]
    MissingDestinationAccount,
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),
    #[error("Client {client} already holds a {currency} account")]
    DuplicateCurrencyAccount { client: ClientId, currency: Currency },
    #[error("Currency {0} is not supported")]
    CurrencyNotSupported(Currency),
    #[error("Client {client} already holds the maximum of {limit} accounts")]
    AccountLimitReached { client: ClientId, limit: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// Business-rule failures. Retrying them without changing the request
    /// gives the same answer.
    pub fn is_business(&self) -> bool {
        !matches!(self, LedgerError::Storage(_))
    }

    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(StorageError::Unavailable(_)))
    }
}

impl From<BalanceError> for LedgerError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InvalidAmount { amount } => LedgerError::InvalidAmount { amount },
            BalanceError::InsufficientFunds { balance, amount } => {
                LedgerError::InsufficientFunds { balance, amount }
            }
            BalanceError::Overflow { balance, amount } => {
                LedgerError::BalanceOverflow { balance, amount }
            }
        }
    }
}
