use serde::{Deserialize, Serialize};

/// Where a source value came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Live,
    Fallback,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Live => "live",
            Origin::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one adapter invocation. Always carries a usable value;
/// `error` records why a fallback was substituted, if one was.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceResult<V> {
    pub origin: Origin,
    pub value: V,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<V> SourceResult<V> {
    pub fn live(value: V) -> Self {
        Self {
            origin: Origin::Live,
            value,
            error: None,
        }
    }

    /// Fallback substituted for a failed live fetch, or served because
    /// live sources are disabled (`error` is `None`).
    pub fn fallback(value: V, error: Option<String>) -> Self {
        Self {
            origin: Origin::Fallback,
            value,
            error,
        }
    }

    pub fn is_live(&self) -> bool {
        self.origin == Origin::Live
    }

    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> SourceResult<U> {
        SourceResult {
            origin: self.origin,
            value: f(self.value),
            error: self.error,
        }
    }
}
