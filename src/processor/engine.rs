use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    account::{Account, AccountNumber},
    balance::{self, BalanceError},
    client::Client,
    command::{TransactionIntent, TransactionKind},
    lifecycle::AccountManager,
    storage::{LedgerCommit, Storage},
    transaction::{Transaction, TransactionId},
};

use super::LedgerError;

type BalanceOp = fn(Decimal, Decimal) -> Result<Decimal, BalanceError>;

/// Executes deposits, withdrawals and transfers.
///
/// Every operation locks the accounts it touches, validates against the
/// locked state and stores the new balances together with the ledger entry
/// in one [`Storage::commit`]. A failed operation leaves storage untouched.
pub struct TransactionEngine<S> {
    manager: Arc<AccountManager<S>>,
}

impl<S: Storage> TransactionEngine<S> {
    pub fn new(manager: Arc<AccountManager<S>>) -> Self {
        Self { manager }
    }

    pub fn accounts(&self) -> &AccountManager<S> {
        &self.manager
    }

    /// Builds an unexecuted transaction record from `intent`.
    pub fn create_transaction(&self, intent: &TransactionIntent) -> Transaction {
        Transaction::from_intent(intent)
    }

    /// Dispatches on `intent.kind`.
    pub fn execute(
        &self,
        intent: &TransactionIntent,
        client: &Client,
    ) -> Result<Transaction, LedgerError> {
        match intent.kind {
            TransactionKind::Deposit => self.deposit(intent, client),
            TransactionKind::Withdrawal => self.withdraw(intent, client),
            TransactionKind::Transfer => self.transfer(intent, client),
        }
    }

    pub fn deposit(
        &self,
        intent: &TransactionIntent,
        client: &Client,
    ) -> Result<Transaction, LedgerError> {
        self.single_account(TransactionKind::Deposit, intent, client, balance::credit)
    }

    pub fn withdraw(
        &self,
        intent: &TransactionIntent,
        client: &Client,
    ) -> Result<Transaction, LedgerError> {
        self.single_account(TransactionKind::Withdrawal, intent, client, balance::debit)
    }

    pub fn transfer(
        &self,
        intent: &TransactionIntent,
        client: &Client,
    ) -> Result<Transaction, LedgerError> {
        self.try_transfer(intent, client)
            .inspect(log_executed)
            .inspect_err(|err| log_rejected(TransactionKind::Transfer, intent, client, err))
    }

    pub fn find_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        debug!(transaction = %id, "Finding transaction");
        self.manager
            .storage()
            .find_transaction(id)?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    pub fn list_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.manager.storage().list_transactions()?)
    }

    fn single_account(
        &self,
        kind: TransactionKind,
        intent: &TransactionIntent,
        client: &Client,
        apply: BalanceOp,
    ) -> Result<Transaction, LedgerError> {
        self.try_single_account(kind, intent, client, apply)
            .inspect(log_executed)
            .inspect_err(|err| log_rejected(kind, intent, client, err))
    }

    fn try_single_account(
        &self,
        kind: TransactionKind,
        intent: &TransactionIntent,
        client: &Client,
        apply: BalanceOp,
    ) -> Result<Transaction, LedgerError> {
        let account_from = intent
            .account_from
            .ok_or(LedgerError::MissingSourceAccount { kind })?;
        let client = self.manager.find_client(client.id)?;
        let account_from = owned_number(&client, account_from)?;

        let slots = self.manager.lock_slots(&[account_from])?;
        let _guards = slots.lock();

        let mut account = self.manager.find_account(account_from)?;
        ensure_operable(&account, &client)?;
        ensure_unlocked(&account)?;
        account.set_balance(apply(account.balance(), intent.amount)?);

        let transaction = Transaction::new(kind, intent.amount, Some(account_from), None);
        self.commit(transaction, vec![account])
    }

    fn try_transfer(
        &self,
        intent: &TransactionIntent,
        client: &Client,
    ) -> Result<Transaction, LedgerError> {
        let account_from = intent
            .account_from
            .ok_or(LedgerError::MissingSourceAccount {
                kind: TransactionKind::Transfer,
            })?;
        let account_to = intent
            .account_to
            .ok_or(LedgerError::MissingDestinationAccount)?;
        if account_from == account_to {
            return Err(LedgerError::SameAccount(account_from));
        }
        let client = self.manager.find_client(client.id)?;
        let account_from = owned_number(&client, account_from)?;

        // any existing account may receive money
        let slots = self.manager.lock_slots(&[account_from, account_to])?;
        let _guards = slots.lock();

        let mut origin = self.manager.find_account(account_from)?;
        let mut destination = self.manager.find_account(account_to)?;

        if origin.balance() < intent.amount {
            return Err(LedgerError::InsufficientFunds {
                balance: origin.balance(),
                amount: intent.amount,
            });
        }
        ensure_operable(&origin, &client)?;
        if origin.currency() != destination.currency() {
            return Err(LedgerError::CurrencyMismatch {
                from: origin.currency(),
                to: destination.currency(),
            });
        }
        ensure_unlocked(&origin)?;
        ensure_unlocked(&destination)?;

        origin.set_balance(balance::debit(origin.balance(), intent.amount)?);
        destination.set_balance(balance::credit(destination.balance(), intent.amount)?);

        let transaction = Transaction::new(
            TransactionKind::Transfer,
            intent.amount,
            Some(account_from),
            Some(account_to),
        );
        self.commit(transaction, vec![origin, destination])
    }

    fn commit(
        &self,
        transaction: Transaction,
        mut accounts: Vec<Account>,
    ) -> Result<Transaction, LedgerError> {
        for account in &mut accounts {
            account.record(transaction.id);
        }
        Ok(self.manager.storage().commit(LedgerCommit {
            transaction,
            accounts,
        })?)
    }
}

/// `account_number` if it is among the client's accounts.
fn owned_number(client: &Client, account_number: AccountNumber) -> Result<AccountNumber, LedgerError> {
    client
        .owned_account(account_number)
        .ok_or(LedgerError::AccountNotFound(account_number))
}

fn ensure_operable(account: &Account, client: &Client) -> Result<(), LedgerError> {
    if account.is_operable_by(client.id) {
        Ok(())
    } else {
        Err(LedgerError::NotAuthorized {
            client: client.id,
            account: account.account_number(),
        })
    }
}

fn ensure_unlocked(account: &Account) -> Result<(), LedgerError> {
    if account.locked() {
        Err(LedgerError::AccountLocked(account.account_number()))
    } else {
        Ok(())
    }
}

fn log_executed(transaction: &Transaction) {
    info!(
        transaction = %transaction.id,
        kind = %transaction.kind,
        amount = %transaction.amount,
        from = ?transaction.account_from,
        to = ?transaction.account_to,
        "Transaction executed"
    );
}

fn log_rejected(
    kind: TransactionKind,
    intent: &TransactionIntent,
    client: &Client,
    err: &LedgerError,
) {
    warn!(
        %kind,
        client = %client.id,
        amount = %intent.amount,
        from = ?intent.account_from,
        to = ?intent.account_to,
        %err,
        "Transaction rejected"
    );
}
