use std::io::Read;

use csv::{Position, StringRecord, StringRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::account::Currency;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptOp {
    Client,
    Open,
    Coholder,
    Lock,
    Deposit,
    Withdrawal,
    Transfer,
}

/// One line of a ledger script. Which columns are required depends on `op`.
#[derive(Debug, Deserialize)]
pub struct ScriptRow {
    pub op: ScriptOp,
    pub client: Option<String>,
    pub account: Option<String>,
    pub to: Option<String>,
    pub currency: Option<Currency>,
    // parsed from the field text, never through f64
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub amount: Option<Decimal>,
}

/// Parses a ledger script in CSV format, yielding each row with its line.
pub struct CsvScriptParser<R> {
    headers: Option<StringRecord>,
    records: StringRecordsIntoIter<R>,
}

impl<R> CsvScriptParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);
        let headers = reader.headers().ok().cloned();

        Self {
            headers,
            records: reader.into_records(),
        }
    }
}

impl<R> Iterator for CsvScriptParser<R>
where
    R: Read,
{
    type Item = (u64, Result<ScriptRow, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.records.next()? {
            Ok(record) => (
                record.position().map_or(0, Position::line),
                record.deserialize(self.headers.as_ref()),
            ),
            Err(err) => (err.position().map_or(0, Position::line), Err(err)),
        };
        Some(row)
    }
}
