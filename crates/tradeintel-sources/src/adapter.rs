use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use tradeintel_models::{KeyClass, SourceResult};

use crate::error::SourceError;

/// One upstream data source together with its static fallback.
///
/// Implementors only describe the live request and the fallback value;
/// the provided [`fetch`](SourceAdapter::fetch) applies the mode switch and
/// turns every upstream failure into a fallback result. Mockable for testing.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Params: Send + Sync;
    type Value: Serialize + DeserializeOwned + Clone + Send + Sync;

    fn name(&self) -> &str;
    fn key_class(&self) -> KeyClass;
    fn cache_key(&self, params: &Self::Params) -> String;

    /// Deterministic value served when the upstream is disabled or failing.
    fn fallback(&self, params: &Self::Params) -> Self::Value;

    /// Whether live sources were enabled at startup.
    fn live_enabled(&self) -> bool;

    /// Whether `params` can be served by the upstream at all.
    fn has_upstream(&self, _params: &Self::Params) -> bool {
        true
    }

    async fn fetch_live(&self, params: &Self::Params) -> Result<Self::Value, SourceError>;

    /// Never fails: upstream errors degrade to [`fallback`](SourceAdapter::fallback).
    async fn fetch(&self, params: &Self::Params) -> SourceResult<Self::Value> {
        if !self.live_enabled() || !self.has_upstream(params) {
            return SourceResult::fallback(self.fallback(params), None);
        }

        let started = Instant::now();
        match self.fetch_live(params).await {
            Ok(value) => {
                debug!(
                    source = self.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Live fetch succeeded"
                );
                SourceResult::live(value)
            }
            Err(e) => {
                warn!(
                    source = self.name(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Live fetch failed, serving fallback"
                );
                SourceResult::fallback(self.fallback(params), Some(e.to_string()))
            }
        }
    }
}
