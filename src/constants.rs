/// Default run configuration values. These mirror the fixed values of a
/// production run and are overridden field-by-field from `config.toml`.

// Source page
pub const SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const TABLE_MARKER_CLASS: &str = "wikitable";
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

// Requested source columns
pub const NAME_COLUMN: &str = "Name";
pub const MARKET_CAP_COLUMN: &str = "MC_USD_Billion";

// Local files
pub const EXCHANGE_RATE_PATH: &str = "./exchange_rate.csv";
pub const OUTPUT_CSV_PATH: &str = "./Largest_banks_data.csv";
pub const DATABASE_PATH: &str = "Banks.db";
pub const TABLE_NAME: &str = "Largest_banks";
pub const PROGRESS_LOG_PATH: &str = "code_log.txt";
pub const TRACING_LOG_DIR: &str = "logs";

/// Configuration file looked up in the working directory
pub const CONFIG_PATH: &str = "config.toml";

// Output column names, in file and table order
pub const COL_NAME: &str = "Name";
pub const COL_USD: &str = "MC_USD_Billion";
pub const COL_GBP: &str = "MC_GBP_Billion";
pub const COL_EUR: &str = "MC_EUR_Billion";
pub const COL_INR: &str = "MC_INR_Billion";

pub const OUTPUT_COLUMNS: [&str; 5] = [COL_NAME, COL_USD, COL_GBP, COL_EUR, COL_INR];

/// USD market cap (billions) above which a bank is reported by the threshold query
pub const LARGE_BANK_THRESHOLD: u32 = 300;
pub const TOP_N: u32 = 5;
