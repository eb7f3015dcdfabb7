use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    account::{Account, AccountNumber, ClientId},
    client::Client,
    transaction::{Transaction, TransactionId},
};

use super::{LedgerCommit, MembershipCommit, Storage, StorageError};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountNumber, Account>,
    // insertion order of `accounts`
    account_order: Vec<AccountNumber>,
    clients: HashMap<ClientId, Client>,
    ledger: Vec<Transaction>,
    ledger_index: HashMap<TransactionId, usize>,
}

impl Tables {
    fn put_account(&mut self, account: Account) {
        let account_number = account.account_number();
        if self.accounts.insert(account_number, account).is_none() {
            self.account_order.push(account_number);
        }
    }

    fn append(&mut self, transaction: Transaction) -> Result<(), StorageError> {
        if self.ledger_index.contains_key(&transaction.id) {
            return Err(StorageError::DuplicateTransaction(transaction.id));
        }
        self.ledger_index.insert(transaction.id, self.ledger.len());
        self.ledger.push(transaction);
        Ok(())
    }
}

/// Single-process store. One `RwLock` over all tables gives `commit` its
/// all-or-nothing behaviour.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn find_account(&self, account_number: AccountNumber) -> Result<Option<Account>, StorageError> {
        Ok(self.tables.read().accounts.get(&account_number).cloned())
    }

    fn save_account(&self, account: Account) -> Result<Account, StorageError> {
        self.tables.write().put_account(account.clone());
        Ok(account)
    }

    fn list_accounts(&self) -> Result<Vec<Account>, StorageError> {
        let tables = self.tables.read();
        Ok(tables
            .account_order
            .iter()
            .filter_map(|account_number| tables.accounts.get(account_number))
            .cloned()
            .collect())
    }

    fn find_client(&self, client_id: ClientId) -> Result<Option<Client>, StorageError> {
        Ok(self.tables.read().clients.get(&client_id).cloned())
    }

    fn save_client(&self, client: Client) -> Result<Client, StorageError> {
        self.tables.write().clients.insert(client.id, client.clone());
        Ok(client)
    }

    fn add_account(
        &self,
        client_id: ClientId,
        account_number: AccountNumber,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if !tables.accounts.contains_key(&account_number) {
            return Err(StorageError::UnknownAccount(account_number));
        }
        let client = tables
            .clients
            .get_mut(&client_id)
            .ok_or(StorageError::UnknownClient(client_id))?;
        client.accounts.insert(account_number);
        Ok(())
    }

    fn save_transaction(&self, transaction: Transaction) -> Result<Transaction, StorageError> {
        self.tables.write().append(transaction.clone())?;
        Ok(transaction)
    }

    fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StorageError> {
        let tables = self.tables.read();
        Ok(tables
            .ledger_index
            .get(&id)
            .map(|&position| tables.ledger[position].clone()))
    }

    fn list_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        Ok(self.tables.read().ledger.clone())
    }

    fn commit(&self, commit: LedgerCommit) -> Result<Transaction, StorageError> {
        let mut tables = self.tables.write();
        // validate everything before the first write
        if let Some(missing) = commit
            .accounts
            .iter()
            .map(Account::account_number)
            .find(|account_number| !tables.accounts.contains_key(account_number))
        {
            return Err(StorageError::UnknownAccount(missing));
        }
        tables.append(commit.transaction.clone())?;
        for account in commit.accounts {
            tables.put_account(account);
        }
        debug!(transaction = %commit.transaction.id, "Ledger commit applied");
        Ok(commit.transaction)
    }

    fn commit_membership(&self, commit: MembershipCommit) -> Result<Account, StorageError> {
        let mut tables = self.tables.write();
        if let Some(&missing) = commit
            .members
            .iter()
            .find(|client_id| !tables.clients.contains_key(*client_id))
        {
            return Err(StorageError::UnknownClient(missing));
        }
        let account_number = commit.account.account_number();
        for client_id in &commit.members {
            if let Some(client) = tables.clients.get_mut(client_id) {
                client.accounts.insert(account_number);
            }
        }
        tables.put_account(commit.account.clone());
        debug!(
            account = %account_number,
            members = commit.members.len(),
            "Membership commit applied"
        );
        Ok(commit.account)
    }
}
