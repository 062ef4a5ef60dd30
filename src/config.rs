use crate::constants;
use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a pipeline run needs. Every field has a default, so a
/// `config.toml` only has to name the values it overrides.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EtlConfig {
    pub source_url: String,
    pub table_class: String,
    pub name_column: String,
    pub market_cap_column: String,
    pub exchange_rate_path: PathBuf,
    pub output_csv_path: PathBuf,
    pub database_path: PathBuf,
    pub table_name: String,
    pub progress_log_path: PathBuf,
    pub tracing_log_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            source_url: constants::SOURCE_URL.to_string(),
            table_class: constants::TABLE_MARKER_CLASS.to_string(),
            name_column: constants::NAME_COLUMN.to_string(),
            market_cap_column: constants::MARKET_CAP_COLUMN.to_string(),
            exchange_rate_path: PathBuf::from(constants::EXCHANGE_RATE_PATH),
            output_csv_path: PathBuf::from(constants::OUTPUT_CSV_PATH),
            database_path: PathBuf::from(constants::DATABASE_PATH),
            table_name: constants::TABLE_NAME.to_string(),
            progress_log_path: PathBuf::from(constants::PROGRESS_LOG_PATH),
            tracing_log_dir: PathBuf::from(constants::TRACING_LOG_DIR),
            request_timeout_secs: constants::REQUEST_TIMEOUT_SECS,
            user_agent: constants::USER_AGENT.to_string(),
        }
    }
}

impl EtlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: EtlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`EtlConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(EtlError::Config("source_url must not be empty".into()));
        }
        if self.table_class.trim().is_empty() {
            return Err(EtlError::Config("table_class must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(EtlError::Config("request_timeout_secs must be positive".into()));
        }
        if !is_plain_identifier(&self.table_name) {
            return Err(EtlError::Config(format!(
                "table_name '{}' is not a plain SQL identifier",
                self.table_name
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
