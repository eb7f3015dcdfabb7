use std::io::Write;

use anyhow::Context;
use csv::Writer;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::account::Currency;

/// Fractional digits always shown for a balance. Wider scales are kept.
const MIN_SCALE: u32 = 2;

#[derive(Debug, Serialize)]
pub struct AccountRow {
    pub account: String,
    pub holder: String,
    pub currency: Currency,
    #[serde(serialize_with = "money")]
    pub balance: Decimal,
    pub locked: bool,
    pub transactions: usize,
}

fn money<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let mut amount = *amount;
    if amount.scale() < MIN_SCALE {
        amount.rescale(MIN_SCALE);
    }
    serializer.collect_str(&amount)
}

pub fn print_accounts<W>(
    output: &mut W,
    rows: impl IntoIterator<Item = AccountRow>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for row in rows {
        let account = row.account.clone();
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write account {account}"))?;
    }
    writer.flush().context("Failed to flush account CSV")
}
