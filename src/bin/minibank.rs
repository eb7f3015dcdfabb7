use std::fs::File;

use anyhow::{Context, Result};
use minibank::{
    bin_utils::{ScriptError, Service},
    config::LedgerConfig,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = match std::env::var("MINIBANK_CONFIG") {
        Ok(path) => {
            LedgerConfig::load(&path).with_context(|| format!("Failed to load config `{path}`"))?
        }
        Err(_) => LedgerConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let filename = std::env::args()
        .nth(1)
        .context("Expected a file name as the first argument")?;
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        config,
        error_printer: Box::new(|line, err| {
            match err {
                ScriptError::Ledger(err) if err.is_business() => {
                    // rejected operations are already logged by the ledger
                }
                err => eprintln!("Error at line {line}: {err}"),
            }
        }),
    };
    service.run()
}
