use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{error, info, warn};
use tradeintel_models::{ToolCallResult, ToolListing};
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::error::{AggregateError, ToolError};
use crate::registry::ToolRegistry;
use crate::validate::validate;

/// Entry point for both bindings: looks tools up, validates arguments and
/// runs the aggregator under a hard deadline. Never panics past this boundary.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    aggregator: Arc<Aggregator>,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, aggregator: Aggregator, call_timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            aggregator: Arc::new(aggregator),
            call_timeout,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Every registered tool, in registration order.
    pub fn list(&self) -> Vec<ToolListing> {
        self.registry.descriptors().map(|d| d.listing()).collect()
    }

    /// Call a tool, folding any failure into an error result.
    pub async fn call(&self, name: &str, args: &Value) -> ToolCallResult {
        match self.try_call(name, args).await {
            Ok(content) => ToolCallResult::success(content),
            Err(e) => ToolCallResult::failure(e.to_content()),
        }
    }

    /// Call a tool, keeping the failure kind for bindings that map it to a status.
    pub async fn try_call(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let call_id = Uuid::new_v4();
        let started = Instant::now();

        let Some(tool) = self.registry.get(name) else {
            warn!(tool = name, %call_id, "Unknown tool requested");
            return Err(ToolError::UnknownOperation(name.to_string()));
        };

        let validated = validate(&tool.descriptor.input_shape, args).inspect_err(|e| {
            warn!(tool = name, %call_id, error = %e, "Rejected tool arguments");
        })?;

        let operation = tool.operation;
        let aggregator = Arc::clone(&self.aggregator);
        let mut handle =
            tokio::spawn(async move { aggregator.run(operation, &validated).await });

        let outcome = match tokio::time::timeout(self.call_timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                warn!(
                    tool = name,
                    %call_id,
                    timeout_secs = self.call_timeout.as_secs(),
                    "Tool call timed out"
                );
                return Err(ToolError::Timeout(self.call_timeout));
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(Ok(content)) => {
                info!(tool = name, %call_id, elapsed_ms, "Tool call complete");
                Ok(content)
            }
            Ok(Err(AggregateError::InvalidArgument { field, reason })) => {
                warn!(tool = name, %call_id, field = %field, reason = %reason, "Rejected tool arguments");
                Err(ToolError::InvalidArguments { field, reason })
            }
            Ok(Err(AggregateError::Internal(message))) => {
                error!(tool = name, %call_id, elapsed_ms, error = %message, "Tool call failed");
                Err(ToolError::Internal)
            }
            Err(e) => {
                error!(tool = name, %call_id, elapsed_ms, error = %e, "Tool task panicked");
                Err(ToolError::Internal)
            }
        }
    }
}
