// Batch ETL: extract, transform, load to CSV, load to SQLite, report

pub mod extract;
pub mod storage;
pub mod transform;

use crate::app::ports::PageSource;
use crate::config::EtlConfig;
use crate::constants::{COL_NAME, COL_USD, LARGE_BANK_THRESHOLD, TOP_N};
use crate::error::Result;
use crate::progress::ProgressLog;
use extract::TableExtractor;
use std::io::Write;
use storage::{BankStore, QueryResult};
use tracing::{info, info_span};
use transform::ExchangeRates;

pub const MSG_START: &str = "Preliminaries complete. Initiating ETL process";
pub const MSG_EXTRACTED: &str = "Data extraction complete. Initiating Transformation process";
pub const MSG_TRANSFORMED: &str = "Data transformation complete. Initiating Loading process";
pub const MSG_CSV_SAVED: &str = "Data saved to CSV file";
pub const MSG_DB_CONNECTED: &str = "SQL Connection initiated";
pub const MSG_DB_LOADED: &str = "Data loaded to Database as a table, Executing queries";
pub const MSG_COMPLETE: &str = "Process Complete";
pub const MSG_DB_CLOSED: &str = "Server Connection closed";

/// A titled report query run after the load.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    pub title: &'static str,
    pub sql: String,
}

/// The three reporting queries, in the order they are printed.
pub fn report_queries(table: &str) -> [ReportQuery; 3] {
    [
        ReportQuery {
            title: "All Banks:",
            sql: format!("SELECT * FROM {table}"),
        },
        ReportQuery {
            title: "Top 5 Banks by USD Market Cap:",
            sql: format!(
                "SELECT {COL_NAME}, {COL_USD} FROM {table} ORDER BY {COL_USD} DESC LIMIT {TOP_N}"
            ),
        },
        ReportQuery {
            title: "Banks with Market Cap over 300 Billion USD:",
            sql: format!("SELECT {COL_NAME} FROM {table} WHERE {COL_USD} > {LARGE_BANK_THRESHOLD}"),
        },
    ]
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub extracted: usize,
    pub loaded: usize,
    pub reports: Vec<(ReportQuery, QueryResult)>,
}

/// Runs every stage in order and writes the query report to `out`.
/// Any failure stops the run; artifacts written by earlier stages stay on disk.
pub fn run(config: &EtlConfig, source: &dyn PageSource, out: &mut dyn Write) -> Result<RunSummary> {
    config.validate()?;
    let progress = ProgressLog::new(&config.progress_log_path);
    progress.log(MSG_START)?;

    let records = {
        let _span = info_span!("extract", url = %config.source_url).entered();
        TableExtractor::new(
            &config.table_class,
            &config.name_column,
            &config.market_cap_column,
        )
        .extract_from(source, &config.source_url)?
    };
    progress.log(MSG_EXTRACTED)?;

    let enriched = {
        let _span = info_span!("transform").entered();
        let rates = ExchangeRates::from_path(&config.exchange_rate_path)?;
        transform::transform(&records, &rates)?
    };
    progress.log(MSG_TRANSFORMED)?;

    {
        let _span = info_span!("load_csv").entered();
        storage::write_csv(&enriched, &config.output_csv_path)?;
    }
    progress.log(MSG_CSV_SAVED)?;

    let _span = info_span!("load_db", table = %config.table_name).entered();
    let mut store = BankStore::open(&config.database_path)?;
    progress.log(MSG_DB_CONNECTED)?;

    let loaded = store.load(&enriched, &config.table_name)?;
    progress.log(MSG_DB_LOADED)?;

    let mut reports = Vec::new();
    for query in report_queries(&config.table_name) {
        let result = store.run_query(&query.sql)?;
        writeln!(out, "\n{}", query.title)?;
        write!(out, "{}", result.render())?;
        reports.push((query, result));
    }
    out.flush()?;
    progress.log(MSG_COMPLETE)?;

    store.close()?;
    progress.log(MSG_DB_CLOSED)?;

    info!(extracted = records.len(), loaded, "ETL run finished");
    Ok(RunSummary {
        extracted: records.len(),
        loaded,
        reports,
    })
}
