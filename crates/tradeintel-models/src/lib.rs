pub mod catalogue;
pub mod config;
pub mod error;
pub mod keys;
pub mod market;
pub mod source;
pub mod tool;

pub use catalogue::{
    AgoaTable, ArbitrageLane, Catalogue, CommodityProfile, CountryProfile, MarketNotes,
    ProductTrend,
};
pub use config::{
    CacheConfig, DispatcherConfig, IntelConfig, Mode, ServerConfig, SourceEndpoint,
    SourcesConfig, TtlConfig, LIVE_SOURCES_ENV,
};
pub use error::ConfigError;
pub use keys::{key_patterns, KeyClass};
pub use market::{CommodityPrice, FxRates, NewsItem, TradeRecord, WeatherReading};
pub use source::{Origin, SourceResult};
pub use tool::{FieldSpec, FieldType, InputShape, ToolCallResult, ToolDescriptor, ToolListing};
