//! Client configuration: credentials, base URL, transport timeouts and inspection hooks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::error::OpperError;

pub const DEFAULT_BASE_URL: &str = "https://api.opper.ai";
pub const API_KEY_ENV_VAR: &str = "OPPER_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "OPPER_BASE_URL";

/// Where the API key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKey {
    /// Read from the `OPPER_API_KEY` environment variable.
    Default,
    Custom(String),
}

impl ApiKey {
    pub fn resolve(&self) -> Result<String, OpperError> {
        match self {
            ApiKey::Custom(key) if key.trim().is_empty() => Err(OpperError::Configuration(
                "API key must not be empty".to_string(),
            )),
            ApiKey::Custom(key) => Ok(key.clone()),
            ApiKey::Default => std::env::var(API_KEY_ENV_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| OpperError::Configuration(format!("{API_KEY_ENV_VAR} not set."))),
        }
    }
}

/// Transport timeouts. No retries; every error reaches the caller.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Total time allowed for one request, including reading the body.
    /// Streaming calls are not bounded by it once the response headers arrived.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

pub type Inspector = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Hooks receiving the raw JSON of every request sent and response received.
#[derive(Clone, Default)]
pub struct InspectorConfig {
    pub request_inspector: Option<Inspector>,
    pub response_inspector: Option<Inspector>,
}

impl fmt::Debug for InspectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectorConfig")
            .field("request_inspector", &self.request_inspector.is_some())
            .field("response_inspector", &self.response_inspector.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub http: HttpClientConfig,
    pub user_agent: String,
    pub inspector: Option<InspectorConfig>,
}

impl ClientConfig {
    /// Resolves the key and picks the base URL from `OPPER_BASE_URL` when it is set.
    pub fn new(api_key: ApiKey) -> Result<Self, OpperError> {
        let base_url = std::env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key: api_key.resolve()?,
            base_url: normalize_base_url(&base_url),
            http: HttpClientConfig::default(),
            user_agent: format!("opperai/{}", env!("CARGO_PKG_VERSION")),
            inspector: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http = config;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn inspect_request<F>(mut self, inspector: F) -> Self
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.inspector
            .get_or_insert_with(InspectorConfig::default)
            .request_inspector = Some(Arc::new(inspector));
        self
    }

    pub fn inspect_response<F>(mut self, inspector: F) -> Self
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.inspector
            .get_or_insert_with(InspectorConfig::default)
            .response_inspector = Some(Arc::new(inspector));
        self
    }

    pub(crate) fn auth_header(&self) -> (String, String) {
        (
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
