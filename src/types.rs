use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the scraped table, in page order.
#[derive(Debug, Clone, PartialEq)]
pub struct BankRecord {
    pub name: String,
    pub market_cap_usd: f64,
}

/// A bank record with its market cap converted into the reporting currencies.
/// Field order is the column order of both sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion")]
    pub market_cap_usd: f64,

    #[serde(rename = "MC_GBP_Billion")]
    pub market_cap_gbp: f64,

    #[serde(rename = "MC_EUR_Billion")]
    pub market_cap_eur: f64,

    #[serde(rename = "MC_INR_Billion")]
    pub market_cap_inr: f64,
}

impl EnrichedBankRecord {
    pub fn base(&self) -> BankRecord {
        BankRecord {
            name: self.name.clone(),
            market_cap_usd: self.market_cap_usd,
        }
    }

    pub fn converted(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Gbp => self.market_cap_gbp,
            Currency::Eur => self.market_cap_eur,
            Currency::Inr => self.market_cap_inr,
        }
    }
}

/// Reporting currencies derived from the USD figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    /// Code as it appears in the rate file's `Currency` column
    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
