use thiserror::Error;

use crate::{
    account::{Account, AccountNumber, ClientId},
    client::Client,
    transaction::{Transaction, TransactionId},
};

pub mod in_memory;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Account {0} is not stored")]
    UnknownAccount(AccountNumber),
    #[error("Client {0} is not stored")]
    UnknownClient(ClientId),
    #[error("Transaction {0} is already in the ledger")]
    DuplicateTransaction(TransactionId),
}

/// Everything one ledger operation writes: the new transaction and the
/// accounts it touched. Stored all together or not at all.
#[derive(Debug, Clone)]
pub struct LedgerCommit {
    pub transaction: Transaction,
    pub accounts: Vec<Account>,
}

/// An account together with the clients to add it to, as written by account
/// opening and co-holder grants. Stored all together or not at all.
#[derive(Debug, Clone)]
pub struct MembershipCommit {
    pub account: Account,
    pub members: Vec<ClientId>,
}

/// Persistence contract the ledger core depends on.
///
/// Implementations hold no business rules.
pub trait Storage: Send + Sync {
    fn find_account(&self, account_number: AccountNumber) -> Result<Option<Account>, StorageError>;

    fn save_account(&self, account: Account) -> Result<Account, StorageError>;

    /// Accounts in creation order.
    fn list_accounts(&self) -> Result<Vec<Account>, StorageError>;

    fn find_client(&self, client_id: ClientId) -> Result<Option<Client>, StorageError>;

    fn save_client(&self, client: Client) -> Result<Client, StorageError>;

    /// Adds a stored account to the client's membership set.
    fn add_account(
        &self,
        client_id: ClientId,
        account_number: AccountNumber,
    ) -> Result<(), StorageError>;

    /// Appends to the ledger. Fails on an id that is already stored.
    fn save_transaction(&self, transaction: Transaction) -> Result<Transaction, StorageError>;

    fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StorageError>;

    /// Ledger in append order.
    fn list_transactions(&self) -> Result<Vec<Transaction>, StorageError>;

    /// Atomically appends `commit.transaction` and overwrites `commit.accounts`.
    fn commit(&self, commit: LedgerCommit) -> Result<Transaction, StorageError>;

    /// Atomically saves `commit.account` and adds it to every member's
    /// membership set.
    fn commit_membership(&self, commit: MembershipCommit) -> Result<Account, StorageError>;
}
