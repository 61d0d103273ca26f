pub mod error;
pub mod ttl;

pub use error::CacheError;
pub use ttl::{CacheEntry, CachedPayload, TtlCache};
