use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetching {url} returned HTTP {status}")]
    Fetch { url: String, status: u16 },

    #[error("HTML parse error: {0}")]
    Parse(String),

    #[error("Column '{column}' not found in table headers {available:?}")]
    Schema {
        column: String,
        available: Vec<String>,
    },

    #[error("Row {row}: cannot parse market cap '{value}' as a number")]
    Format { row: usize, value: String },

    #[error("Exchange rate for {0} missing from rate table")]
    MissingRate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Query failed ({sql}): {message}")]
    Query { sql: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
