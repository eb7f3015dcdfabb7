use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, MutexGuard};

use crate::account::AccountNumber;

/// Registry of per-account mutexes.
///
/// Holding an account's guard grants exclusive right to read-modify-write
/// that account. Several accounts are always locked in ascending
/// `AccountNumber` order, so two transfers in opposite directions cannot
/// deadlock.
#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountNumber, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the mutexes of `accounts`, sorted and de-duplicated.
    /// Nothing is locked until [`LockSet::lock`].
    pub fn slots(&self, accounts: &[AccountNumber]) -> LockSet {
        let mut ordered = accounts.to_vec();
        ordered.sort_unstable();
        ordered.dedup();
        let mut registry = self.slots.lock();
        LockSet {
            slots: ordered
                .into_iter()
                .map(|account_number| Arc::clone(registry.entry(account_number).or_default()))
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

pub struct LockSet {
    slots: Vec<Arc<Mutex<()>>>,
}

impl LockSet {
    /// Blocks until every account in the set is held. Released on drop.
    pub fn lock(&self) -> Vec<MutexGuard<'_, ()>> {
        self.slots.iter().map(|slot| slot.lock()).collect()
    }
}
