// Sinks for the enriched table: flat CSV file and SQLite

pub mod csv_file;
pub mod database;

pub use csv_file::{read_csv, write_csv};
pub use database::{BankStore, QueryResult};
