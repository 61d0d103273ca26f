use async_trait::async_trait;
use tradeintel_models::{key_patterns, KeyClass, Mode, WeatherReading};

use crate::adapter::SourceAdapter;
use crate::error::SourceError;

/// Static weather table keyed by ISO country code. There is no network
/// upstream: the live path reads the same table.
pub struct WeatherAdapter {
    mode: Mode,
    table: Vec<WeatherReading>,
    default: WeatherReading,
}

impl WeatherAdapter {
    pub fn new(mode: Mode, table: Vec<WeatherReading>, default: WeatherReading) -> Self {
        Self {
            mode,
            table,
            default,
        }
    }

    fn lookup(&self, country_code: &str) -> WeatherReading {
        self.table
            .iter()
            .find(|w| w.country_code.eq_ignore_ascii_case(country_code))
            .cloned()
            .unwrap_or_else(|| WeatherReading {
                country_code: country_code.to_ascii_uppercase(),
                ..self.default.clone()
            })
    }
}

#[async_trait]
impl SourceAdapter for WeatherAdapter {
    type Params = String;
    type Value = WeatherReading;

    fn name(&self) -> &str {
        "weather"
    }

    fn key_class(&self) -> KeyClass {
        KeyClass::Weather
    }

    fn cache_key(&self, params: &String) -> String {
        key_patterns::weather(&params.to_ascii_uppercase())
    }

    fn fallback(&self, params: &String) -> WeatherReading {
        self.lookup(params)
    }

    fn live_enabled(&self) -> bool {
        self.mode.live_sources
    }

    async fn fetch_live(&self, params: &String) -> Result<WeatherReading, SourceError> {
        Ok(self.lookup(params))
    }
}
