//! Trade intelligence tool server.
//!
//! Exposes one tool catalogue over two bindings: newline-delimited JSON-RPC
//! on stdin/stdout ([`stdio`]) and an HTTP API ([`http`]). Both go through
//! the same [`Dispatcher`], so validation, caching and deadlines behave
//! identically regardless of transport.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! let config = tradeintel::load_config(None)?;
//! let dispatcher = tradeintel::build_dispatcher(&config)?;
//! let result = dispatcher
//!     .call("get_exchange_rates", &serde_json::json!({"symbols": ["ETB"]}))
//!     .await;
//! println!("{}", result.content);
//! # Ok(())
//! # }
//! ```

pub use tradeintel_cache as cache;
pub use tradeintel_models as models;
pub use tradeintel_sources as sources;
pub use tradeintel_tools as tools;

pub mod http;
pub mod stdio;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tradeintel_cache::TtlCache;
use tradeintel_models::{Catalogue, IntelConfig};
use tradeintel_sources::Sources;
use tradeintel_tools::{Aggregator, Dispatcher, ToolRegistry};

/// Load configuration from `path` (or defaults) and apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<IntelConfig, anyhow::Error> {
    let mut config = IntelConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load config: {}", path.display()),
        None => "Failed to build default config".to_string(),
    })?;
    config
        .apply_env(|key| std::env::var(key).ok())
        .context("Invalid environment override")?;
    Ok(config)
}

/// Build a Dispatcher from configuration.
pub fn build_dispatcher(config: &IntelConfig) -> Result<Dispatcher, anyhow::Error> {
    let catalogue = match &config.catalogue_path {
        Some(path) => Catalogue::load(Path::new(path))
            .with_context(|| format!("Failed to load catalogue: {path}"))?,
        None => Catalogue::default(),
    };

    let sources =
        Sources::from_config(config, &catalogue).context("Failed to build source adapters")?;
    let registry = ToolRegistry::standard(&catalogue).context("Failed to register tools")?;
    let cache = Arc::new(TtlCache::new(config.cache.max_entries));
    let aggregator = Aggregator::new(
        sources,
        cache,
        config.cache.ttl_seconds.clone(),
        Arc::new(catalogue),
    );

    let call_timeout = config.call_timeout();
    tracing::info!(
        mode = config.mode.label(),
        tools = registry.len(),
        call_timeout_secs = call_timeout.as_secs(),
        "Dispatcher ready"
    );

    Ok(Dispatcher::new(registry, aggregator, call_timeout))
}
