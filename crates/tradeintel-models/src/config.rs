use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::keys::KeyClass;

/// Environment variable that selects live vs. simulated sources.
pub const LIVE_SOURCES_ENV: &str = "TRADEINTEL_LIVE_SOURCES";

/// Grace added on top of the summed adapter timeouts when no explicit
/// dispatcher deadline is configured.
const CALL_TIMEOUT_GRACE_SECONDS: u64 = 5;

/// Top-level configuration. Built once at startup and handed to every
/// component by value or reference; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IntelConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Optional TOML file replacing the built-in catalogue tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue_path: Option<String>,
}

/// Process-wide source mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Mode {
    /// `true` calls real upstreams, `false` always serves fallback values.
    #[serde(default)]
    pub live_sources: bool,
}

impl Mode {
    pub fn live() -> Self {
        Self { live_sources: true }
    }

    pub fn simulated() -> Self {
        Self {
            live_sources: false,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.live_sources {
            "live"
        } else {
            "simulated"
        }
    }
}

/// Configuration for the in-process TTL cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Upper bound on stored entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default)]
    pub ttl_seconds: TtlConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_seconds: TtlConfig::default(),
        }
    }
}

/// Freshness window per key class, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TtlConfig {
    #[serde(default = "default_trade_ttl")]
    pub trade: u64,
    #[serde(default = "default_commodity_ttl")]
    pub commodity: u64,
    #[serde(default = "default_fx_ttl")]
    pub fx: u64,
    #[serde(default = "default_news_ttl")]
    pub news: u64,
    #[serde(default = "default_weather_ttl")]
    pub weather: u64,
}

impl TtlConfig {
    pub fn for_class(&self, class: KeyClass) -> Duration {
        let seconds = match class {
            KeyClass::Trade => self.trade,
            KeyClass::Commodity => self.commodity,
            KeyClass::Fx => self.fx,
            KeyClass::News => self.news,
            KeyClass::Weather => self.weather,
        };
        Duration::from_secs(seconds)
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            trade: default_trade_ttl(),
            commodity: default_commodity_ttl(),
            fx: default_fx_ttl(),
            news: default_news_ttl(),
            weather: default_weather_ttl(),
        }
    }
}

/// Upstream endpoint settings for one adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceEndpoint {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl SourceEndpoint {
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcesConfig {
    /// Government trade-statistics API.
    #[serde(default = "default_census")]
    pub census: SourceEndpoint,
    /// Multilateral economic-indicator API (commodity indices).
    #[serde(default = "default_world_bank")]
    pub world_bank: SourceEndpoint,
    /// Currency-conversion API; the base currency is appended as a path segment.
    #[serde(default = "default_fx")]
    pub fx: SourceEndpoint,
    /// Syndicated RSS news feed.
    #[serde(default = "default_news")]
    pub news: SourceEndpoint,
}

impl SourcesConfig {
    /// Sum of every network adapter timeout.
    pub fn total_timeout(&self) -> Duration {
        [&self.census, &self.world_bank, &self.fx, &self.news]
            .iter()
            .map(|e| e.timeout())
            .sum()
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            census: default_census(),
            world_bank: default_world_bank(),
            fx: default_fx(),
            news: default_news(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DispatcherConfig {
    /// Hard cap on a single tool call. Derived from adapter timeouts when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

impl IntelConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read a TOML config file. `None` yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(LIVE_SOURCES_ENV) {
            self.mode.live_sources = parse_toggle(LIVE_SOURCES_ENV, &raw)?;
        }
        Ok(())
    }

    /// Outer deadline applied by the dispatcher to each call.
    pub fn call_timeout(&self) -> Duration {
        match self.dispatcher.call_timeout_seconds {
            Some(secs) => Duration::from_secs(secs),
            None => {
                self.sources.total_timeout() + Duration::from_secs(CALL_TIMEOUT_GRACE_SECONDS)
            }
        }
    }
}

fn parse_toggle(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidToggle {
            var: var.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn default_max_entries() -> u64 {
    512
}
fn default_trade_ttl() -> u64 {
    1800
}
fn default_commodity_ttl() -> u64 {
    1800
}
fn default_fx_ttl() -> u64 {
    3600
}
fn default_news_ttl() -> u64 {
    3600
}
fn default_weather_ttl() -> u64 {
    900
}
fn default_census() -> SourceEndpoint {
    SourceEndpoint::new(
        "https://api.census.gov/data/timeseries/intltrade/imports/hs",
        30,
    )
}
fn default_world_bank() -> SourceEndpoint {
    SourceEndpoint::new("https://api.worldbank.org/v2", 30)
}
fn default_fx() -> SourceEndpoint {
    SourceEndpoint::new("https://api.exchangerate-api.com/v4/latest", 10)
}
fn default_news() -> SourceEndpoint {
    SourceEndpoint::new("https://feeds.reuters.com/reuters/businessNews", 15)
}
fn default_http_addr() -> String {
    "0.0.0.0:8000".to_string()
}
