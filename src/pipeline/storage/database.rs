use crate::config::is_plain_identifier;
use crate::constants::{COL_EUR, COL_GBP, COL_INR, COL_NAME, COL_USD};
use crate::error::{EtlError, Result};
use crate::types::EnrichedBankRecord;
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};

/// SQLite connection holding the loaded bank table.
pub struct BankStore {
    conn: Connection,
}

/// Column names and rows of one query, in the order SQLite produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl BankStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!("Opened SQLite database at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Replaces `table` with exactly `records`: drop, recreate and insert in
    /// one transaction. Returns the number of rows inserted.
    pub fn load(&mut self, records: &[EnrichedBankRecord], table: &str) -> Result<usize> {
        if !is_plain_identifier(table) {
            return Err(EtlError::Config(format!(
                "table name '{}' is not a plain SQL identifier",
                table
            )));
        }

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            r#"
            DROP TABLE IF EXISTS "{table}";
            CREATE TABLE "{table}" (
                "{COL_NAME}" TEXT,
                "{COL_USD}"  REAL,
                "{COL_GBP}"  REAL,
                "{COL_EUR}"  REAL,
                "{COL_INR}"  REAL
            );
            "#
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                r#"INSERT INTO "{table}" ("{COL_NAME}", "{COL_USD}", "{COL_GBP}", "{COL_EUR}", "{COL_INR}")
                   VALUES (?1, ?2, ?3, ?4, ?5)"#
            ))?;
            for r in records {
                stmt.execute(params![
                    r.name,
                    r.market_cap_usd,
                    r.market_cap_gbp,
                    r.market_cap_eur,
                    r.market_cap_inr
                ])?;
            }
        }
        tx.commit()?;

        info!("Loaded {} rows into table {}", records.len(), table);
        Ok(records.len())
    }

    /// Runs one read-only statement and returns every row. Statements that
    /// would modify the database are refused.
    pub fn run_query(&self, sql: &str) -> Result<QueryResult> {
        let query_err = |e: rusqlite::Error| EtlError::Query {
            sql: sql.to_string(),
            message: e.to_string(),
        };

        let mut stmt = self.conn.prepare(sql).map_err(query_err)?;
        if !stmt.readonly() {
            return Err(EtlError::Query {
                sql: sql.to_string(),
                message: "only read-only statements may be run".into(),
            });
        }
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(query_err)?;
        while let Some(row) = cursor.next().map_err(query_err)? {
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(query_err)?;
            rows.push(values);
        }
        debug!(rows = rows.len(), sql, "Query finished");
        Ok(QueryResult { columns, rows })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| EtlError::Database(e))
    }
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One line per row in tuple form, e.g. `('JPMorgan Chase', 432.92)`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let _ = writeln!(out, "{}", format_row(row));
        }
        out
    }
}

pub fn format_row(row: &[Value]) -> String {
    let cells: Vec<String> = row.iter().map(format_value).collect();
    if cells.len() == 1 {
        format!("({},)", cells[0])
    } else {
        format!("({})", cells.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => format_real(*f),
        Value::Text(s) => quote(s),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Shortest round-trip digits, laid out as fixed notation for decimal
/// exponents in `-4..16` and as `d.ddde+XX` (sign, two-digit minimum)
/// otherwise: `80.0`, `0.0001`, `1e-05`, `1e+16`.
pub fn format_real(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // `{:e}` yields the shortest round-trip mantissa, e.g. "-4.3292e2"
    let sci = format!("{:e}", f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    if !(-4..16).contains(&exp) {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exp.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let body = if exp >= 0 {
        let int_len = exp as usize + 1;
        if digits.len() <= int_len {
            format!("{}{}.0", digits, "0".repeat(int_len - digits.len()))
        } else {
            format!("{}.{}", &digits[..int_len], &digits[int_len..])
        }
    } else {
        format!("0.{}{}", "0".repeat((-exp - 1) as usize), digits)
    };
    format!("{}{}", sign, body)
}

/// String literal in the same form as Python's `repr`: single quotes unless
/// the text holds a `'` and no `"`, with backslash escapes for the quote,
/// backslash and control characters.
fn quote(s: &str) -> String {
    let q = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                let _ = if code < 0x100 {
                    write!(out, "\\x{:02x}", code)
                } else if code < 0x10000 {
                    write!(out, "\\u{:04x}", code)
                } else {
                    write!(out, "\\U{:08x}", code)
                };
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<EnrichedBankRecord> {
        (0..n)
            .map(|i| {
                let usd = 100.0 + 50.0 * i as f64;
                EnrichedBankRecord {
                    name: format!("Bank {}", i),
                    market_cap_usd: usd,
                    market_cap_gbp: usd * 0.8,
                    market_cap_eur: usd * 0.9,
                    market_cap_inr: usd * 80.0,
                }
            })
            .collect()
    }

    fn to_records(result: &QueryResult) -> Vec<EnrichedBankRecord> {
        result
            .rows
            .iter()
            .map(|row| {
                let real = |v: &Value| match v {
                    Value::Real(f) => *f,
                    other => panic!("expected REAL, got {other:?}"),
                };
                let name = match &row[0] {
                    Value::Text(s) => s.clone(),
                    other => panic!("expected TEXT, got {other:?}"),
                };
                EnrichedBankRecord {
                    name,
                    market_cap_usd: real(&row[1]),
                    market_cap_gbp: real(&row[2]),
                    market_cap_eur: real(&row[3]),
                    market_cap_inr: real(&row[4]),
                }
            })
            .collect()
    }

    #[test]
    fn full_dump_returns_loaded_rows_in_order() {
        let mut store = BankStore::open_in_memory().unwrap();
        let input = records(10);
        assert_eq!(store.load(&input, "Largest_banks").unwrap(), 10);

        let result = store.run_query("SELECT * FROM Largest_banks").unwrap();
        assert_eq!(
            result.columns,
            vec!["Name", "MC_USD_Billion", "MC_GBP_Billion", "MC_EUR_Billion", "MC_INR_Billion"]
        );
        assert_eq!(result.len(), 10);
        assert_eq!(to_records(&result), input);
    }

    #[test]
    fn load_replaces_previous_contents() {
        let mut store = BankStore::open_in_memory().unwrap();
        store.load(&records(10), "banks").unwrap();
        store.load(&records(3), "banks").unwrap();

        let result = store.run_query("SELECT * FROM banks").unwrap();
        assert_eq!(to_records(&result), records(3));
    }

    #[test]
    fn top_five_is_descending_and_bounded() {
        let mut store = BankStore::open_in_memory().unwrap();
        store.load(&records(10), "banks").unwrap();

        let result = store
            .run_query("SELECT Name, MC_USD_Billion FROM banks ORDER BY MC_USD_Billion DESC LIMIT 5")
            .unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result.rows[0][0], Value::Text("Bank 9".into()));
        let caps: Vec<f64> = result
            .rows
            .iter()
            .map(|r| match r[1] {
                Value::Real(f) => f,
                _ => panic!("expected REAL"),
            })
            .collect();
        assert!(caps.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn threshold_query_returns_exact_subset() {
        let mut store = BankStore::open_in_memory().unwrap();
        let input = records(10);
        store.load(&input, "banks").unwrap();

        let result = store
            .run_query("SELECT Name FROM banks WHERE MC_USD_Billion > 300")
            .unwrap();
        let names: Vec<Value> = result.rows.into_iter().map(|mut r| r.remove(0)).collect();
        let expected: Vec<Value> = input
            .iter()
            .filter(|r| r.market_cap_usd > 300.0)
            .map(|r| Value::Text(r.name.clone()))
            .collect();
        // 300 itself is excluded
        assert_eq!(names.len(), 5);
        assert_eq!(names, expected);
    }

    #[test]
    fn malformed_sql_is_query_error() {
        let store = BankStore::open_in_memory().unwrap();
        assert!(matches!(
            store.run_query("SELEC * FROM banks"),
            Err(EtlError::Query { .. })
        ));
    }

    #[test]
    fn missing_table_is_query_error() {
        let store = BankStore::open_in_memory().unwrap();
        match store.run_query("SELECT * FROM nowhere") {
            Err(EtlError::Query { sql, message }) => {
                assert_eq!(sql, "SELECT * FROM nowhere");
                assert!(message.contains("no such table"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn write_statements_are_refused() {
        let mut store = BankStore::open_in_memory().unwrap();
        store.load(&records(2), "banks").unwrap();
        assert!(matches!(
            store.run_query("DELETE FROM banks"),
            Err(EtlError::Query { .. })
        ));
        assert_eq!(store.run_query("SELECT * FROM banks").unwrap().len(), 2);
    }

    #[test]
    fn rejects_unsafe_table_name() {
        let mut store = BankStore::open_in_memory().unwrap();
        assert!(matches!(
            store.load(&records(1), "x\"; DROP TABLE y; --"),
            Err(EtlError::Config(_))
        ));
    }

    #[test]
    fn file_backed_store_persists_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Banks.db");

        let mut store = BankStore::open(&path).unwrap();
        store.load(&records(4), "Largest_banks").unwrap();
        store.close().unwrap();

        let reopened = BankStore::open(&path).unwrap();
        assert_eq!(reopened.run_query("SELECT * FROM Largest_banks").unwrap().len(), 4);
    }

    #[test]
    fn top_five_ties_keep_load_order() {
        let mut store = BankStore::open_in_memory().unwrap();
        let input: Vec<EnrichedBankRecord> = (0..10)
            .map(|i| {
                let usd = if i % 2 == 0 { 500.0 } else { 100.0 };
                EnrichedBankRecord {
                    name: format!("B{}", i),
                    market_cap_usd: usd,
                    market_cap_gbp: usd,
                    market_cap_eur: usd,
                    market_cap_inr: usd,
                }
            })
            .collect();
        store.load(&input, "banks").unwrap();

        let result = store
            .run_query("SELECT Name, MC_USD_Billion FROM banks ORDER BY MC_USD_Billion DESC LIMIT 5")
            .unwrap();
        let names: Vec<Value> = result.rows.into_iter().map(|mut r| r.remove(0)).collect();
        let expected: Vec<Value> = ["B0", "B2", "B4", "B6", "B8"]
            .iter()
            .map(|n| Value::Text(n.to_string()))
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn reals_render_like_python_floats() {
        assert_eq!(format_real(432.92), "432.92");
        assert_eq!(format_real(80.0), "80.0");
        assert_eq!(format_real(35910.71), "35910.71");
        assert_eq!(format_real(0.0001), "0.0001");
        assert_eq!(format_real(0.00001), "1e-05");
        assert_eq!(format_real(1e16), "1e+16");
        assert_eq!(format_real(1.5e20), "1.5e+20");
        assert_eq!(format_real(1234567890123456.0), "1234567890123456.0");
        assert_eq!(format_real(-2.5), "-2.5");
        assert_eq!(format_real(0.0), "0.0");
        assert_eq!(format_real(1e100), "1e+100");
        assert_eq!(format_real(f64::INFINITY), "inf");
    }

    #[test]
    fn text_escapes_control_characters() {
        assert_eq!(quote("a\nb\tc"), "'a\\nb\\tc'");
        assert_eq!(quote("back\\slash"), "'back\\\\slash'");
        assert_eq!(quote("both ' and \""), "'both \\' and \"'");
        assert_eq!(quote("bell\u{7}"), "'bell\\x07'");
    }

    #[test]
    fn rows_render_as_tuples() {
        assert_eq!(
            format_row(&[Value::Text("JPMorgan Chase".into()), Value::Real(432.92)]),
            "('JPMorgan Chase', 432.92)"
        );
        assert_eq!(format_row(&[Value::Text("HSBC".into())]), "('HSBC',)");
        assert_eq!(format_row(&[Value::Real(80.0), Value::Null]), "(80.0, None)");
        assert_eq!(format_row(&[Value::Text("Lloyd's".into())]), "(\"Lloyd's\",)");
    }
}
