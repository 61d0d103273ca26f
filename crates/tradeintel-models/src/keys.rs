use serde::{Deserialize, Serialize};

/// Volatility classes used to pick a cache TTL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeyClass {
    Trade,
    Commodity,
    Fx,
    News,
    Weather,
}

impl KeyClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyClass::Trade => "trade",
            KeyClass::Commodity => "commodity",
            KeyClass::Fx => "fx",
            KeyClass::News => "news",
            KeyClass::Weather => "weather",
        }
    }
}

impl std::fmt::Display for KeyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key pattern conventions for the cache.
///
/// Every adapter derives its cache key from its parameters through these
/// helpers so that equal requests always share one entry.
///
/// - Currency rates: `fx:{base}:{symbols}` (e.g., `fx:USD:ETB,GHS`, `fx:USD:*`)
/// - Commodity prices: `commodity:{name}` (e.g., `commodity:coffee`)
/// - Trade statistics: `trade:{hs}:{country}:{period}` (e.g., `trade:0901:5300:2024-06`)
/// - News feed: `news:feed`
/// - Weather: `weather:{country_code}` (e.g., `weather:ET`)
pub mod key_patterns {
    /// `symbols` is expected to be sorted; an empty list means "all".
    pub fn fx(base: &str, symbols: &[String]) -> String {
        if symbols.is_empty() {
            format!("fx:{base}:*")
        } else {
            format!("fx:{base}:{}", symbols.join(","))
        }
    }

    pub fn commodity(name: &str) -> String {
        format!("commodity:{name}")
    }

    pub fn trade(hs_code: &str, country_code: &str, period: &str) -> String {
        format!("trade:{hs_code}:{country_code}:{period}")
    }

    pub fn news() -> String {
        "news:feed".to_string()
    }

    pub fn weather(country_code: &str) -> String {
        format!("weather:{country_code}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fx_key_lists_symbols() {
        let symbols = vec!["ETB".to_string(), "GHS".to_string()];
        assert_eq!(key_patterns::fx("USD", &symbols), "fx:USD:ETB,GHS");
        assert_eq!(key_patterns::fx("EUR", &[]), "fx:EUR:*");
    }

    #[test]
    fn trade_key_includes_period() {
        assert_eq!(
            key_patterns::trade("0901", "5300", "2024-06"),
            "trade:0901:5300:2024-06"
        );
    }

    #[test]
    fn key_class_serializes_snake_case() {
        let json = serde_json::to_string(&KeyClass::Fx).unwrap();
        assert_eq!(json, "\"fx\"");
        assert_eq!(KeyClass::Weather.to_string(), "weather");
    }
}
