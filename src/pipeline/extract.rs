//! Extraction: locate the marker-class table in the page and pull the two
//! requested columns out as [`BankRecord`]s.
//!
//! Selection rule: the first `<table>` in document order whose `class`
//! attribute contains the marker class. Within it, the header is the first
//! row made only of `<th>` cells; every later row with at least one `<td>`
//! is a data row. Rows of nested tables are ignored. `rowspan` and `colspan`
//! are expanded, so a spanning cell repeats its text into every grid slot it
//! covers.

use crate::app::ports::PageSource;
use crate::error::{EtlError, Result};
use crate::types::BankRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

static NEWLINES: OnceLock<Regex> = OnceLock::new();

fn newlines() -> &'static Regex {
    NEWLINES.get_or_init(|| Regex::new(r"[\n]").expect("newline pattern is valid"))
}

/// Header and body text of one HTML table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    pub fn column_index(&self, column: &str) -> Result<usize> {
        let wanted = normalize_whitespace(column);
        self.headers
            .iter()
            .position(|h| *h == wanted)
            .ok_or_else(|| EtlError::Schema {
                column: column.to_string(),
                available: self.headers.clone(),
            })
    }
}

pub struct TableExtractor {
    table_class: String,
    name_column: String,
    market_cap_column: String,
}

impl TableExtractor {
    pub fn new(
        table_class: impl Into<String>,
        name_column: impl Into<String>,
        market_cap_column: impl Into<String>,
    ) -> Self {
        Self {
            table_class: table_class.into(),
            name_column: name_column.into(),
            market_cap_column: market_cap_column.into(),
        }
    }

    /// Fetch `url` through `source` and extract the records.
    pub fn extract_from(&self, source: &dyn PageSource, url: &str) -> Result<Vec<BankRecord>> {
        let page = source.fetch(url)?;
        self.extract(&page)
    }

    pub fn extract(&self, html: &str) -> Result<Vec<BankRecord>> {
        let table = read_first_table(html, &self.table_class)?;
        let name_idx = table.column_index(&self.name_column)?;
        let cap_idx = table.column_index(&self.market_cap_column)?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            let row_no = i + 1;
            let cell = |idx: usize| {
                row.get(idx).ok_or_else(|| {
                    EtlError::Parse(format!(
                        "row {} has {} cells, column {} is missing",
                        row_no,
                        row.len(),
                        idx + 1
                    ))
                })
            };
            let name = cell(name_idx)?.trim().to_string();
            let market_cap_usd = parse_market_cap(cell(cap_idx)?, row_no)?;
            records.push(BankRecord {
                name,
                market_cap_usd,
            });
        }

        info!("Extracted {} bank records", records.len());
        if records.is_empty() {
            warn!("Matched table has no data rows - the page structure may have changed");
        }
        Ok(records)
    }
}

/// Strips embedded newlines, then parses the remaining text as a float.
pub fn parse_market_cap(raw: &str, row: usize) -> Result<f64> {
    let cleaned = newlines().replace_all(raw, "");
    let cleaned = cleaned.trim();
    cleaned.parse::<f64>().map_err(|_| EtlError::Format {
        row,
        value: cleaned.to_string(),
    })
}

pub fn read_first_table(html: &str, table_class: &str) -> Result<ParsedTable> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").expect("static selector is valid");
    let row_selector = Selector::parse("tr").expect("static selector is valid");

    let table = document
        .select(&table_selector)
        .find(|t| t.value().classes().any(|c| c == table_class))
        .ok_or_else(|| {
            EtlError::Parse(format!("no <table> with class '{}' found on page", table_class))
        })?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut carry: Vec<Option<SpanCarry>> = Vec::new();

    for tr in table.select(&row_selector) {
        if !belongs_to(&tr, &table) {
            continue;
        }
        let cells = row_cells(&tr);
        if cells.is_empty() {
            continue;
        }
        let expanded = expand_row(&cells, &mut carry);
        match headers {
            None => {
                if cells.iter().all(|c| c.value().name() == "th") {
                    headers = Some(expanded.iter().map(|h| normalize_whitespace(h)).collect());
                }
            }
            Some(_) => {
                if cells.iter().any(|c| c.value().name() == "td") {
                    rows.push(expanded);
                }
            }
        }
    }

    let headers = headers.ok_or_else(|| {
        EtlError::Parse(format!("table with class '{}' has no header row", table_class))
    })?;
    debug!(?headers, rows = rows.len(), "Parsed table");
    Ok(ParsedTable { headers, rows })
}

/// True when `row`'s closest enclosing `<table>` is `table` itself.
fn belongs_to(row: &ElementRef, table: &ElementRef) -> bool {
    row.ancestors()
        .find(|n| n.value().as_element().map_or(false, |e| e.name() == "table"))
        .map_or(false, |n| n.id() == table.id())
}

fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "th" | "td"))
        .collect()
}

// Browsers clamp spans to these limits
const MAX_COLSPAN: usize = 1_000;
const MAX_ROWSPAN: usize = 65_534;

/// A `rowspan` cell still owed to the rows below it.
#[derive(Debug)]
struct SpanCarry {
    text: String,
    remaining: usize,
}

/// Lays the physical cells of one row onto the table grid: columns still
/// covered by a `rowspan` from above are filled first, and each cell is
/// repeated `colspan` times.
fn expand_row(cells: &[ElementRef], carry: &mut Vec<Option<SpanCarry>>) -> Vec<String> {
    let mut out = Vec::new();
    for cell in cells {
        while let Some(text) = take_carry(carry, out.len()) {
            out.push(text);
        }
        let text = cell_text(cell);
        let rowspan = span_attr(cell, "rowspan", MAX_ROWSPAN);
        let colspan = span_attr(cell, "colspan", MAX_COLSPAN);
        for _ in 0..colspan {
            let col = out.len();
            if rowspan > 1 {
                if carry.len() <= col {
                    carry.resize_with(col + 1, || None);
                }
                carry[col] = Some(SpanCarry {
                    text: text.clone(),
                    remaining: rowspan - 1,
                });
            }
            out.push(text.clone());
        }
    }
    // Spans reaching past the last physical cell of this row
    while let Some(text) = take_carry(carry, out.len()) {
        out.push(text);
    }
    out
}

fn take_carry(carry: &mut [Option<SpanCarry>], col: usize) -> Option<String> {
    let slot = carry.get_mut(col)?;
    let pending = slot.as_mut()?;
    let text = pending.text.clone();
    pending.remaining -= 1;
    if pending.remaining == 0 {
        *slot = None;
    }
    Some(text)
}

/// Positive integer span attribute; missing, zero or malformed values count as 1.
fn span_attr(cell: &ElementRef, name: &str, max: usize) -> usize {
    cell.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map_or(1, |n| n.min(max))
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>()
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
