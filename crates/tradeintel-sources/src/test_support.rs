//! Adapter wrappers for exercising the cache, aggregator and dispatcher
//! without real upstreams: call counting, artificial latency and panics.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tradeintel_models::{KeyClass, SourceResult};

use crate::adapter::SourceAdapter;
use crate::error::SourceError;

type DynAdapter<P, V> = Arc<dyn SourceAdapter<Params = P, Value = V>>;

/// Delegates to an inner adapter and counts how often each path ran.
pub struct CountingAdapter<P, V> {
    inner: DynAdapter<P, V>,
    live_calls: AtomicUsize,
    fallback_calls: AtomicUsize,
}

impl<P, V> CountingAdapter<P, V> {
    pub fn new(inner: DynAdapter<P, V>) -> Self {
        Self {
            inner,
            live_calls: AtomicUsize::new(0),
            fallback_calls: AtomicUsize::new(0),
        }
    }

    pub fn live_calls(&self) -> usize {
        self.live_calls.load(Ordering::SeqCst)
    }

    pub fn fallback_calls(&self) -> usize {
        self.fallback_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P, V> SourceAdapter for CountingAdapter<P, V>
where
    P: Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Params = P;
    type Value = V;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn key_class(&self) -> KeyClass {
        self.inner.key_class()
    }

    fn cache_key(&self, params: &P) -> String {
        self.inner.cache_key(params)
    }

    fn fallback(&self, params: &P) -> V {
        self.fallback_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fallback(params)
    }

    fn live_enabled(&self) -> bool {
        self.inner.live_enabled()
    }

    fn has_upstream(&self, params: &P) -> bool {
        self.inner.has_upstream(params)
    }

    async fn fetch_live(&self, params: &P) -> Result<V, SourceError> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_live(params).await
    }
}

/// Sleeps before every fetch, to push a call past its deadline.
pub struct SlowAdapter<P, V> {
    inner: DynAdapter<P, V>,
    delay: Duration,
}

impl<P, V> SlowAdapter<P, V> {
    pub fn new(inner: DynAdapter<P, V>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<P, V> SourceAdapter for SlowAdapter<P, V>
where
    P: Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Params = P;
    type Value = V;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn key_class(&self) -> KeyClass {
        self.inner.key_class()
    }

    fn cache_key(&self, params: &P) -> String {
        self.inner.cache_key(params)
    }

    fn fallback(&self, params: &P) -> V {
        self.inner.fallback(params)
    }

    fn live_enabled(&self) -> bool {
        self.inner.live_enabled()
    }

    async fn fetch_live(&self, params: &P) -> Result<V, SourceError> {
        self.inner.fetch_live(params).await
    }

    async fn fetch(&self, params: &P) -> SourceResult<V> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch(params).await
    }
}

/// Panics on every call, standing in for a broken merge step.
pub struct PanickingAdapter<P, V> {
    name: String,
    key_class: KeyClass,
    _marker: PhantomData<fn(P) -> V>,
}

impl<P, V> PanickingAdapter<P, V> {
    pub fn new(name: &str, key_class: KeyClass) -> Self {
        Self {
            name: name.to_string(),
            key_class,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<P, V> SourceAdapter for PanickingAdapter<P, V>
where
    P: Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Params = P;
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn key_class(&self) -> KeyClass {
        self.key_class
    }

    fn cache_key(&self, _params: &P) -> String {
        format!("panic:{}", self.name)
    }

    fn fallback(&self, _params: &P) -> V {
        panic!("{} adapter exploded", self.name)
    }

    fn live_enabled(&self) -> bool {
        false
    }

    async fn fetch_live(&self, _params: &P) -> Result<V, SourceError> {
        panic!("{} adapter exploded", self.name)
    }
}
