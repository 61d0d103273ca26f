pub mod aggregator;
pub mod dispatcher;
pub mod error;
mod ops;
pub mod registry;
pub mod validate;

pub use aggregator::Aggregator;
pub use dispatcher::Dispatcher;
pub use error::{AggregateError, RegistryError, ToolError};
pub use ops::arbitrage::gross_margin;
pub use registry::{Operation, RegisteredTool, RegistryBuilder, ToolRegistry};
pub use validate::{validate, ArgValue, ValidatedArgs};
