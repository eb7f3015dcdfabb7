use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, prelude::Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::transaction::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountNumber(Uuid);

impl AccountNumber {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for AccountNumber {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ClientId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Ars,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Eur, Currency::Gbp, Currency::Ars];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Ars => "ARS",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
#[error("Unknown currency `{0}`")]
pub struct UnknownCurrency(String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCurrency(s.to_owned()))
    }
}

/// A single-currency account.
///
/// Balance and history only change through the transaction engine, which
/// holds the account's exclusive lock while doing so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    account_number: AccountNumber,
    balance: Decimal,
    currency: Currency,
    holder: ClientId,
    second_holders: BTreeSet<ClientId>,
    transactions: Vec<TransactionId>,
    locked: bool,
    creation_date: NaiveDate,
}

impl Account {
    /// Opens an empty, unlocked account dated today.
    ///
    /// A second holder equal to `holder` is dropped.
    pub fn open(currency: Currency, holder: ClientId, second_holder: Option<ClientId>) -> Self {
        let mut account = Self {
            account_number: AccountNumber::generate(),
            balance: Decimal::zero(),
            currency,
            holder,
            second_holders: BTreeSet::new(),
            transactions: Vec::new(),
            locked: false,
            creation_date: Utc::now().date_naive(),
        };
        if let Some(second_holder) = second_holder {
            account.grant(second_holder);
        }
        account
    }

    pub fn account_number(&self) -> AccountNumber {
        self.account_number
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn holder(&self) -> ClientId {
        self.holder
    }

    pub fn second_holders(&self) -> &BTreeSet<ClientId> {
        &self.second_holders
    }

    /// Ids of transactions touching this account, in execution order.
    pub fn transactions(&self) -> &[TransactionId] {
        &self.transactions
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn creation_date(&self) -> NaiveDate {
        self.creation_date
    }

    /// Whether `client` may debit this account.
    pub fn is_operable_by(&self, client: ClientId) -> bool {
        self.holder == client || self.second_holders.contains(&client)
    }

    /// Adds a co-holder. Returns `false` if the client already had access.
    pub(crate) fn grant(&mut self, client: ClientId) -> bool {
        if client == self.holder {
            return false;
        }
        self.second_holders.insert(client)
    }

    /// Returns `false` if the account was already locked.
    pub(crate) fn lock(&mut self) -> bool {
        !std::mem::replace(&mut self.locked, true)
    }

    pub(crate) fn set_balance(&mut self, balance: Decimal) {
        debug_assert!(balance >= Decimal::zero());
        self.balance = balance;
    }

    pub(crate) fn record(&mut self, transaction_id: TransactionId) {
        self.transactions.push(transaction_id);
    }
}
