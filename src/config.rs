use std::{io::ErrorKind, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::account::Currency;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_level: String,
    /// Currencies accounts may be opened in.
    pub currencies: Vec<Currency>,
    /// Cap on accounts held (as primary holder) per client.
    pub max_accounts_per_client: Option<usize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            currencies: Currency::ALL.to_vec(),
            max_accounts_per_client: None,
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads the config at `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(source) => {
                let config = Self::from_toml_str(&source)?;
                info!(path = %path.display(), "Config loaded");
                Ok(config)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Config not found, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn supports(&self, currency: Currency) -> bool {
        self.currencies.contains(&currency)
    }
}
