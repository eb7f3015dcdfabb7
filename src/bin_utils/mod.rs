//! Replays a CSV ledger script against a fresh in-memory ledger and prints
//! the resulting accounts. Used by the binary and by integration tests.

use std::{
    collections::HashMap,
    io::{Read, Write},
    sync::Arc,
};

use anyhow::Result;
use csv_parser::{CsvScriptParser, ScriptOp, ScriptRow};
use csv_printer::{AccountRow, print_accounts};
use thiserror::Error;
use tracing::debug;

use crate::{
    account::{AccountNumber, ClientId},
    client::Client,
    command::TransactionIntent,
    config::LedgerConfig,
    lifecycle::AccountManager,
    processor::{LedgerError, engine::TransactionEngine},
    storage::in_memory::InMemoryStorage,
};

pub mod csv_parser;
pub mod csv_printer;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Malformed row: {0}")]
    Parse(#[from] csv::Error),
    #[error("Column `{column}` is required for {op:?}")]
    MissingColumn { op: ScriptOp, column: &'static str },
    #[error("Unknown client alias `{0}`")]
    UnknownClient(String),
    #[error("Unknown account alias `{0}`")]
    UnknownAccount(String),
    #[error("Account alias `{0}` is already bound")]
    DuplicateAccount(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub config: LedgerConfig,
    pub error_printer: Box<dyn FnMut(u64, ScriptError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvScriptParser::new(self.input);
        let manager = Arc::new(AccountManager::with_config(
            Arc::new(InMemoryStorage::new()),
            self.config,
        ));
        let mut replay = Replay {
            engine: TransactionEngine::new(manager),
            clients: HashMap::new(),
            accounts: HashMap::new(),
        };

        for (line, row) in parser {
            if let Err(err) = row.map_err(ScriptError::from).and_then(|row| replay.apply(row)) {
                (self.error_printer)(line, err);
            }
        }

        let client_names: HashMap<ClientId, &str> = replay
            .clients
            .iter()
            .map(|(alias, id)| (*id, alias.as_str()))
            .collect();
        let account_names: HashMap<AccountNumber, &str> = replay
            .accounts
            .iter()
            .map(|(alias, number)| (*number, alias.as_str()))
            .collect();
        let accounts = replay.engine.accounts().list_accounts()?;

        print_accounts(
            self.output,
            accounts.iter().map(|acc| AccountRow {
                account: account_names
                    .get(&acc.account_number())
                    .map_or_else(|| acc.account_number().to_string(), |n| n.to_string()),
                holder: client_names
                    .get(&acc.holder())
                    .map_or_else(|| acc.holder().to_string(), |n| n.to_string()),
                currency: acc.currency(),
                balance: acc.balance(),
                locked: acc.locked(),
                transactions: acc.transactions().len(),
            }),
        )
    }
}

struct Replay {
    engine: TransactionEngine<InMemoryStorage>,
    clients: HashMap<String, ClientId>,
    accounts: HashMap<String, AccountNumber>,
}

impl Replay {
    fn apply(&mut self, row: ScriptRow) -> Result<(), ScriptError> {
        debug!(op = ?row.op, "Replaying row");
        let op = row.op;
        match op {
            ScriptOp::Client => {
                let alias = required(op, "client", row.client)?;
                let id = *self.clients.entry(alias).or_insert_with(ClientId::generate);
                self.engine.accounts().register_client(id)?;
            }
            ScriptOp::Open => {
                let holder = self.client(op, row.client)?;
                // `to` names the optional second holder
                let second_holder = match row.to {
                    Some(alias) => Some(self.client(op, Some(alias))?),
                    None => None,
                };
                let alias = required(op, "account", row.account)?;
                if self.accounts.contains_key(&alias) {
                    return Err(ScriptError::DuplicateAccount(alias));
                }
                let currency = required(op, "currency", row.currency)?;
                let account = self.engine.accounts().create_account(
                    currency,
                    &holder,
                    second_holder.as_ref(),
                )?;
                self.accounts.insert(alias, account.account_number());
            }
            ScriptOp::Coholder => {
                let client = self.client(op, row.client)?;
                let account = self.account(op, "account", row.account)?;
                self.engine.accounts().add_coholder(account, &client)?;
            }
            ScriptOp::Lock => {
                let account = self.account(op, "account", row.account)?;
                self.engine.accounts().lock_account(account)?;
            }
            ScriptOp::Deposit | ScriptOp::Withdrawal => {
                let client = self.client(op, row.client)?;
                let account = self.account(op, "account", row.account)?;
                let amount = required(op, "amount", row.amount)?;
                let intent = if op == ScriptOp::Deposit {
                    TransactionIntent::deposit(account, amount)
                } else {
                    TransactionIntent::withdrawal(account, amount)
                };
                self.engine.execute(&intent, &client)?;
            }
            ScriptOp::Transfer => {
                let client = self.client(op, row.client)?;
                let from = self.account(op, "account", row.account)?;
                let to = self.account(op, "to", row.to)?;
                let amount = required(op, "amount", row.amount)?;
                self.engine
                    .transfer(&TransactionIntent::transfer(from, to, amount), &client)?;
            }
        }
        Ok(())
    }

    fn client(&self, op: ScriptOp, alias: Option<String>) -> Result<Client, ScriptError> {
        let alias = required(op, "client", alias)?;
        let id = self
            .clients
            .get(&alias)
            .ok_or(ScriptError::UnknownClient(alias))?;
        Ok(self.engine.accounts().find_client(*id)?)
    }

    fn account(
        &self,
        op: ScriptOp,
        column: &'static str,
        alias: Option<String>,
    ) -> Result<AccountNumber, ScriptError> {
        let alias = required(op, column, alias)?;
        self.accounts
            .get(&alias)
            .copied()
            .ok_or(ScriptError::UnknownAccount(alias))
    }
}

fn required<T>(op: ScriptOp, column: &'static str, value: Option<T>) -> Result<T, ScriptError> {
    value.ok_or(ScriptError::MissingColumn { op, column })
}
