use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    account::{Account, AccountNumber, ClientId, Currency},
    client::Client,
    config::LedgerConfig,
    processor::{
        LedgerError,
        account_locks::{AccountLocks, LockSet},
    },
    storage::{MembershipCommit, Storage},
};

/// Opens accounts, grants co-holders and locks accounts.
///
/// Owns the per-account lock registry; the transaction engine borrows it
/// so that lifecycle changes and money movements never interleave on the
/// same account.
pub struct AccountManager<S> {
    storage: Arc<S>,
    locks: AccountLocks,
    config: LedgerConfig,
}

impl<S: Storage> AccountManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_config(storage, LedgerConfig::default())
    }

    pub fn with_config(storage: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            storage,
            locks: AccountLocks::new(),
            config,
        }
    }

    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    #[cfg(test)]
    pub(crate) fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    /// Lock slots for `accounts`. A slot is only allocated once its account
    /// is known to storage.
    pub(crate) fn lock_slots(&self, accounts: &[AccountNumber]) -> Result<LockSet, LedgerError> {
        for &account_number in accounts {
            if self.storage.find_account(account_number)?.is_none() {
                return Err(LedgerError::AccountNotFound(account_number));
            }
        }
        Ok(self.locks.slots(accounts))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Stores a client with no accounts.
    pub fn register_client(&self, client_id: ClientId) -> Result<Client, LedgerError> {
        if let Some(existing) = self.storage.find_client(client_id)? {
            return Ok(existing);
        }
        let client = self.storage.save_client(Client::new(client_id))?;
        info!(client = %client_id, "Client registered");
        Ok(client)
    }

    pub fn find_client(&self, client_id: ClientId) -> Result<Client, LedgerError> {
        self.storage
            .find_client(client_id)?
            .ok_or(LedgerError::ClientNotFound(client_id))
    }

    pub fn find_account(&self, account_number: AccountNumber) -> Result<Account, LedgerError> {
        debug!(account = %account_number, "Finding account");
        self.storage
            .find_account(account_number)?
            .ok_or(LedgerError::AccountNotFound(account_number))
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.storage.list_accounts()?)
    }

    /// Opens a zero-balance account and adds it to the membership of its
    /// holders. A second holder equal to the holder is ignored.
    pub fn create_account(
        &self,
        currency: Currency,
        holder: &Client,
        second_holder: Option<&Client>,
    ) -> Result<Account, LedgerError> {
        self.open_account(currency, holder, second_holder)
            .inspect_err(|err| warn!(holder = %holder.id, %currency, %err, "Account not created"))
    }

    fn open_account(
        &self,
        currency: Currency,
        holder: &Client,
        second_holder: Option<&Client>,
    ) -> Result<Account, LedgerError> {
        if !self.config.supports(currency) {
            return Err(LedgerError::CurrencyNotSupported(currency));
        }
        let holder = self.find_client(holder.id)?;
        let second_holder = match second_holder {
            Some(second) if second.id != holder.id => Some(self.find_client(second.id)?),
            _ => None,
        };

        // co-held accounts count as well
        let mut held = 0;
        for account_number in &holder.accounts {
            let Some(account) = self.storage.find_account(*account_number)? else {
                continue;
            };
            if account.currency() == currency {
                return Err(LedgerError::DuplicateCurrencyAccount {
                    client: holder.id,
                    currency,
                });
            }
            held += 1;
        }
        if let Some(limit) = self.config.max_accounts_per_client {
            if held >= limit {
                return Err(LedgerError::AccountLimitReached {
                    client: holder.id,
                    limit,
                });
            }
        }

        let second_holder = second_holder.map(|client| client.id);
        let account = self.storage.commit_membership(MembershipCommit {
            account: Account::open(currency, holder.id, second_holder),
            members: [Some(holder.id), second_holder].into_iter().flatten().collect(),
        })?;
        info!(
            account = %account.account_number(),
            holder = %holder.id,
            second_holder = ?second_holder,
            %currency,
            "Account created"
        );
        Ok(account)
    }

    /// Locks the account against any further balance change. Locking a
    /// locked account succeeds without writing anything.
    pub fn lock_account(&self, account_number: AccountNumber) -> Result<Account, LedgerError> {
        let slots = self
            .lock_slots(&[account_number])
            .inspect_err(|err| warn!(account = %account_number, %err, "Account not locked"))?;
        let _guards = slots.lock();
        let mut account = self.find_account(account_number)?;
        if account.lock() {
            account = self.storage.save_account(account)?;
            info!(account = %account_number, "Account locked");
        } else {
            debug!(account = %account_number, "Account already locked");
        }
        Ok(account)
    }

    /// Grants `client` the right to operate the account.
    pub fn add_coholder(
        &self,
        account_number: AccountNumber,
        client: &Client,
    ) -> Result<Account, LedgerError> {
        let client = self.find_client(client.id)?;
        let slots = self.lock_slots(&[account_number])?;
        let _guards = slots.lock();
        let mut account = self.find_account(account_number)?;
        if account.locked() {
            warn!(account = %account_number, client = %client.id, "Co-holder rejected, account locked");
            return Err(LedgerError::AccountLocked(account_number));
        }
        let granted = account.grant(client.id);
        let account = self.storage.commit_membership(MembershipCommit {
            account,
            members: vec![client.id],
        })?;
        if granted {
            info!(account = %account_number, client = %client.id, "Co-holder added");
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::in_memory::InMemoryStorage;

    use super::*;

    fn manager() -> AccountManager<InMemoryStorage> {
        AccountManager::new(Arc::new(InMemoryStorage::new()))
    }

    fn client(manager: &AccountManager<InMemoryStorage>) -> Client {
        manager.register_client(ClientId::generate()).unwrap()
    }

    #[test]
    fn create_account_registers_membership() {
        let manager = manager();
        let holder = client(&manager);
        let second = client(&manager);

        let acc = manager
            .create_account(Currency::Usd, &holder, Some(&second))
            .unwrap();
        assert_eq!(acc.holder(), holder.id);
        assert!(acc.second_holders().contains(&second.id));
        assert_eq!(manager.find_account(acc.account_number()).unwrap(), acc);

        for id in [holder.id, second.id] {
            let stored = manager.find_client(id).unwrap();
            assert!(stored.accounts.contains(&acc.account_number()));
        }
    }

    #[test]
    fn second_holder_same_as_holder_is_ignored() {
        let manager = manager();
        let holder = client(&manager);
        let acc = manager
            .create_account(Currency::Eur, &holder, Some(&holder))
            .unwrap();
        assert!(acc.second_holders().is_empty());
    }

    #[test]
    fn create_account_for_unknown_client() {
        let manager = manager();
        let stranger = Client::new(ClientId::generate());
        let err = manager
            .create_account(Currency::Usd, &stranger, None)
            .unwrap_err();
        assert_eq!(err, LedgerError::ClientNotFound(stranger.id));

        let holder = client(&manager);
        let err = manager
            .create_account(Currency::Usd, &holder, Some(&stranger))
            .unwrap_err();
        assert_eq!(err, LedgerError::ClientNotFound(stranger.id));
        assert!(manager.list_accounts().unwrap().is_empty());
    }

    #[test]
    fn one_account_per_currency() {
        let manager = manager();
        let holder = client(&manager);
        manager.create_account(Currency::Usd, &holder, None).unwrap();
        let err = manager
            .create_account(Currency::Usd, &holder, None)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateCurrencyAccount {
                client: holder.id,
                currency: Currency::Usd
            }
        );

        // being co-holder of a EUR account blocks opening an own one
        let other = client(&manager);
        manager
            .create_account(Currency::Eur, &other, Some(&holder))
            .unwrap();
        let err = manager
            .create_account(Currency::Eur, &holder, None)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateCurrencyAccount {
                client: holder.id,
                currency: Currency::Eur
            }
        );
        manager.create_account(Currency::Gbp, &holder, None).unwrap();
        // the co-holder's grant does not block the other holder's currencies
        manager.create_account(Currency::Usd, &other, None).unwrap();
    }

    #[test]
    fn granted_co_holder_cannot_open_same_currency() {
        let manager = manager();
        let holder = client(&manager);
        let co_holder = client(&manager);
        let acc = manager.create_account(Currency::Usd, &holder, None).unwrap();
        manager.add_coholder(acc.account_number(), &co_holder).unwrap();

        let err = manager
            .create_account(Currency::Usd, &co_holder, None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateCurrencyAccount { .. }));
    }

    #[test]
    fn unknown_accounts_get_no_lock_slot() {
        let manager = manager();
        let holder = client(&manager);
        let acc = manager.create_account(Currency::Usd, &holder, None).unwrap();

        for _ in 0..10 {
            let ghost = AccountNumber::generate();
            assert!(manager.lock_account(ghost).is_err());
            assert!(manager.add_coholder(ghost, &holder).is_err());
        }
        assert_eq!(manager.locks().len(), 0);
        manager.lock_account(acc.account_number()).unwrap();
        assert_eq!(manager.locks().len(), 1);
    }

    #[test]
    fn config_limits_are_enforced() {
        let config = LedgerConfig {
            currencies: vec![Currency::Usd, Currency::Eur],
            max_accounts_per_client: Some(1),
            ..Default::default()
        };
        let manager = AccountManager::with_config(Arc::new(InMemoryStorage::new()), config);
        let holder = manager.register_client(ClientId::generate()).unwrap();

        let err = manager
            .create_account(Currency::Ars, &holder, None)
            .unwrap_err();
        assert_eq!(err, LedgerError::CurrencyNotSupported(Currency::Ars));

        manager.create_account(Currency::Usd, &holder, None).unwrap();
        let err = manager
            .create_account(Currency::Eur, &holder, None)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::AccountLimitReached {
                client: holder.id,
                limit: 1
            }
        );
    }

    #[test]
    fn lock_is_idempotent() {
        let manager = manager();
        let holder = client(&manager);
        let acc = manager.create_account(Currency::Usd, &holder, None).unwrap();

        let first = manager.lock_account(acc.account_number()).unwrap();
        let second = manager.lock_account(acc.account_number()).unwrap();
        assert!(first.locked());
        assert_eq!(first, second);
        assert!(second.transactions().is_empty());

        let err = manager
            .lock_account(AccountNumber::generate())
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }

    #[test]
    fn add_coholder() {
        let manager = manager();
        let holder = client(&manager);
        let co_holder = client(&manager);
        let acc = manager.create_account(Currency::Usd, &holder, None).unwrap();

        let updated = manager
            .add_coholder(acc.account_number(), &co_holder)
            .unwrap();
        assert!(updated.second_holders().contains(&co_holder.id));
        let again = manager
            .add_coholder(acc.account_number(), &co_holder)
            .unwrap();
        assert_eq!(again.second_holders().len(), 1);
        assert!(
            manager
                .find_client(co_holder.id)
                .unwrap()
                .accounts
                .contains(&acc.account_number())
        );

        // the holder never shows up as co-holder
        let same = manager.add_coholder(acc.account_number(), &holder).unwrap();
        assert!(!same.second_holders().contains(&holder.id));
    }

    #[test]
    fn add_coholder_to_locked_account() {
        let manager = manager();
        let holder = client(&manager);
        let co_holder = client(&manager);
        let acc = manager.create_account(Currency::Usd, &holder, None).unwrap();
        manager.lock_account(acc.account_number()).unwrap();

        let err = manager
            .add_coholder(acc.account_number(), &co_holder)
            .unwrap_err();
        assert_eq!(err, LedgerError::AccountLocked(acc.account_number()));
        assert!(
            manager
                .find_account(acc.account_number())
                .unwrap()
                .second_holders()
                .is_empty()
        );
    }
}
