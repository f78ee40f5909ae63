use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-side behavior of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<Cache>,
}

/// Exact-match caching: identical calls within `exact_match_cache_ttl` seconds are
/// answered from the server cache. A TTL of zero disables it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(default)]
    pub exact_match_cache_ttl: u64,
}

impl FunctionConfiguration {
    pub fn with_exact_match_cache(ttl_seconds: u64) -> Self {
        Self {
            cache: Some(Cache {
                exact_match_cache_ttl: ttl_seconds,
            }),
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache
            .is_some_and(|cache| cache.exact_match_cache_ttl > 0)
    }
}

/// The last-known projection of a remote function, as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub id: u64,
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
    #[serde(default, alias = "output_schema")]
    pub out_schema: Option<Value>,
    #[serde(default)]
    pub configuration: Option<FunctionConfiguration>,
}
