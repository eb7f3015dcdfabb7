use std::collections::BTreeSet;

use crate::account::{AccountNumber, ClientId};

/// The slice of a client profile the ledger needs for authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub accounts: BTreeSet<AccountNumber>,
}

impl Client {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            accounts: BTreeSet::new(),
        }
    }

    /// Returns the client's own account matching `account_number`, if any.
    pub fn owned_account(&self, account_number: AccountNumber) -> Option<AccountNumber> {
        self.accounts.get(&account_number).copied()
    }
}
