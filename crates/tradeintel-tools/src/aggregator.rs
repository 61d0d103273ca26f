use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use tradeintel_cache::{CachedPayload, TtlCache};
use tradeintel_models::{Catalogue, Origin, SourceResult, TtlConfig};
use tradeintel_sources::{SourceAdapter, Sources};

use crate::error::AggregateError;
use crate::ops;
use crate::registry::Operation;
use crate::validate::ValidatedArgs;

/// Composes source results, routed through the shared cache, into tool payloads.
pub struct Aggregator {
    sources: Sources,
    cache: Arc<TtlCache>,
    ttls: TtlConfig,
    catalogue: Arc<Catalogue>,
}

impl Aggregator {
    pub fn new(
        sources: Sources,
        cache: Arc<TtlCache>,
        ttls: TtlConfig,
        catalogue: Arc<Catalogue>,
    ) -> Self {
        Self {
            sources,
            cache,
            ttls,
            catalogue,
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Build the payload for `operation`. Source failures never surface here;
    /// errors are bad arguments or a broken merge step.
    pub async fn run(
        &self,
        operation: Operation,
        args: &ValidatedArgs,
    ) -> Result<Value, AggregateError> {
        match operation {
            Operation::ExchangeRates => ops::fx::run(self, args).await,
            Operation::CommodityPrices => ops::commodities::run(self, args).await,
            Operation::TradeData => ops::trade::run(self, args).await,
            Operation::TradeNews => ops::news::run(self, args).await,
            Operation::Weather => ops::weather::run(self, args).await,
            Operation::CommoditySnapshot => ops::snapshot::run(self, args).await,
            Operation::ArbitrageScan => ops::arbitrage::run(self, args).await,
            Operation::MarketTrends => ops::trends::run(self, args).await,
            Operation::AgoaCountries => ops::agoa::countries(self, args),
            Operation::AgoaEligibility => ops::agoa::eligibility(self, args),
            Operation::MarketOverview => ops::overview::run(self, args).await,
        }
    }

    /// Cache-aside fetch: a fresh entry is decoded as-is, otherwise the
    /// adapter runs once (live or fallback) and its result is stored.
    pub async fn through_cache<A>(
        &self,
        adapter: &A,
        params: &A::Params,
    ) -> Result<SourceResult<A::Value>, AggregateError>
    where
        A: SourceAdapter + ?Sized,
    {
        let key = adapter.cache_key(params);
        let ttl = self.ttls.for_class(adapter.key_class());

        let entry = self
            .cache
            .get_or_fetch(&key, ttl, || async {
                let result = adapter.fetch(params).await;
                match serde_json::to_value(&result.value) {
                    Ok(value) => CachedPayload {
                        value,
                        origin: result.origin,
                        error: result.error,
                    },
                    Err(e) => CachedPayload {
                        value: Value::Null,
                        origin: Origin::Fallback,
                        error: Some(format!("could not encode source value: {e}")),
                    },
                }
            })
            .await;

        debug!(
            source = adapter.name(),
            key = %key,
            origin = %entry.origin,
            "Source value ready"
        );

        Ok(SourceResult {
            origin: entry.origin,
            value: entry.decode()?,
            error: entry.error,
        })
    }
}
