//! Currency conversion of the extracted USD market caps.

use crate::error::{EtlError, Result};
use crate::types::{BankRecord, Currency, EnrichedBankRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// Currency code → USD exchange rate, as read from the rate file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeRates {
    rates: HashMap<String, f64>,
}

impl ExchangeRates {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            EtlError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open exchange rate file {}: {}", path.display(), e),
            ))
        })?;
        Self::from_reader(file)
    }

    /// Reads a CSV with at least `Currency` and `Rate` columns; extra columns
    /// and extra currencies are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = HashMap::new();
        for row in reader.deserialize::<RateRow>() {
            let row = row?;
            rates.insert(row.currency, row.rate);
        }
        debug!(currencies = rates.len(), "Loaded exchange rates");
        Ok(Self { rates })
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn rate(&self, currency: Currency) -> Result<f64> {
        self.get(currency.code())
            .ok_or_else(|| EtlError::MissingRate(currency.code().to_string()))
    }
}

impl FromIterator<(String, f64)> for ExchangeRates {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

/// Round to two decimals, ties away from zero (`f64::round` semantics).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Adds the GBP, EUR and INR columns. Every required rate is resolved
/// before any row is touched, so a missing rate fails the whole batch.
pub fn transform(records: &[BankRecord], rates: &ExchangeRates) -> Result<Vec<EnrichedBankRecord>> {
    let gbp = rates.rate(Currency::Gbp)?;
    let eur = rates.rate(Currency::Eur)?;
    let inr = rates.rate(Currency::Inr)?;

    let enriched: Vec<EnrichedBankRecord> = records
        .iter()
        .map(|r| EnrichedBankRecord {
            name: r.name.clone(),
            market_cap_usd: r.market_cap_usd,
            market_cap_gbp: round2(r.market_cap_usd * gbp),
            market_cap_eur: round2(r.market_cap_usd * eur),
            market_cap_inr: round2(r.market_cap_usd * inr),
        })
        .collect();

    info!("Converted {} records into GBP, EUR and INR", enriched.len());
    Ok(enriched)
}
