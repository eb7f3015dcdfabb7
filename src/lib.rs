/// Accounts, their identifiers and currencies.
pub mod account;

/// Exact decimal credit/debit rules shared by every balance change.
pub mod balance;

/// The part of a client profile needed to authorize account access.
pub mod client;

/// Transaction intents, as received from the presentation layer.
pub mod command;

/// Ledger configuration, loaded from TOML.
pub mod config;

/// Opening, co-holding and locking accounts.
pub mod lifecycle;

/// Transaction engine executing deposits, withdrawals and transfers.
/// Every money movement is serialized per account and committed to
/// storage as a single unit.
pub mod processor;

/// Storage contract the ledger depends on, plus an in-memory implementation.
pub mod storage;

/// Persisted transaction records.
pub mod transaction;

/// Bootstraps the ledger from a CSV script. Lives here rather than in the
/// binary so integration tests can drive it.
pub mod bin_utils;
