use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("JSON deserialization error for key={key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
