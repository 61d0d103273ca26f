pub mod adapter;
pub mod census;
pub mod commodity;
pub mod error;
pub mod fx;
pub mod http;
pub mod news;
pub mod test_support;
pub mod weather;

use std::sync::Arc;

use tradeintel_models::{
    Catalogue, CommodityPrice, CommodityProfile, FxRates, IntelConfig, NewsItem, TradeRecord,
    WeatherReading,
};

pub use adapter::SourceAdapter;
pub use census::{CensusAdapter, TradeQuery};
pub use commodity::CommodityAdapter;
pub use error::SourceError;
pub use fx::{FxAdapter, FxQuery};
pub use http::HttpFetcher;
pub use news::NewsAdapter;
pub use weather::WeatherAdapter;

pub type FxSource = dyn SourceAdapter<Params = FxQuery, Value = FxRates>;
pub type CommoditySource = dyn SourceAdapter<Params = CommodityProfile, Value = CommodityPrice>;
pub type TradeSource = dyn SourceAdapter<Params = TradeQuery, Value = Vec<TradeRecord>>;
pub type NewsSource = dyn SourceAdapter<Params = (), Value = Vec<NewsItem>>;
pub type WeatherSource = dyn SourceAdapter<Params = String, Value = WeatherReading>;

/// One adapter per upstream. Fields are trait objects so tests can swap
/// in wrappers from [`test_support`].
#[derive(Clone)]
pub struct Sources {
    pub fx: Arc<FxSource>,
    pub commodity: Arc<CommoditySource>,
    pub trade: Arc<TradeSource>,
    pub news: Arc<NewsSource>,
    pub weather: Arc<WeatherSource>,
}

impl Sources {
    /// Build every adapter from the startup configuration and catalogue.
    pub fn from_config(config: &IntelConfig, catalogue: &Catalogue) -> Result<Self, SourceError> {
        let http = HttpFetcher::new()?;
        let mode = config.mode;

        tracing::info!(mode = mode.label(), "Building source adapters");

        Ok(Self {
            fx: Arc::new(FxAdapter::new(
                config.sources.fx.clone(),
                http.clone(),
                mode,
                catalogue.fallback_fx.clone(),
            )),
            commodity: Arc::new(CommodityAdapter::new(
                config.sources.world_bank.clone(),
                http.clone(),
                mode,
            )),
            trade: Arc::new(CensusAdapter::new(
                config.sources.census.clone(),
                http.clone(),
                mode,
                catalogue.sample_trade.clone(),
            )),
            news: Arc::new(NewsAdapter::new(
                config.sources.news.clone(),
                http,
                mode,
                catalogue.default_news.clone(),
            )),
            weather: Arc::new(WeatherAdapter::new(
                mode,
                catalogue.weather.clone(),
                catalogue.default_weather.clone(),
            )),
        })
    }
}
