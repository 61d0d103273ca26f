use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency rates quoted as units of `symbol` per one unit of `base`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FxRates {
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl FxRates {
    pub fn rate(&self, symbol: &str) -> Option<Decimal> {
        if symbol.eq_ignore_ascii_case(&self.base) {
            return Some(Decimal::ONE);
        }
        self.rates.get(&symbol.to_ascii_uppercase()).copied()
    }

    /// Keep only `symbols` (all rates when empty).
    pub fn retain_symbols(&mut self, symbols: &[String]) {
        if symbols.is_empty() {
            return;
        }
        self.rates.retain(|code, _| symbols.iter().any(|s| s == code));
    }
}

/// Latest reference price for one commodity, in the catalogue's unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommodityPrice {
    pub commodity: String,
    pub price: Decimal,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

/// One row of monthly import statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub country_code: String,
    pub country_name: String,
    pub hs_code: String,
    pub description: String,
    /// General imports value, USD.
    pub general_value: Decimal,
    /// Imports for consumption value, USD.
    pub consumption_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub link: String,
}

impl NewsItem {
    pub fn mentions(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.title.to_lowercase().contains(&keyword)
            || self.summary.to_lowercase().contains(&keyword)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherReading {
    pub country_code: String,
    pub temperature_c: i32,
    pub humidity_pct: u32,
    pub conditions: String,
    pub rainfall: String,
}
