use std::sync::Arc;

use crate::core::{ApiKey, ClientConfig, HttpClient, OpperError};
use crate::functions::Functions;
use crate::indexes::Indexes;
use crate::spans::Spans;

/// Entry point of the SDK.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Opper {
    http: Arc<HttpClient>,
}

impl Opper {
    /// Client against the default base URL (or `OPPER_BASE_URL`).
    pub fn new(api_key: ApiKey) -> Result<Self, OpperError> {
        Self::with_config(ClientConfig::new(api_key)?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, OpperError> {
        Ok(Self {
            http: Arc::new(HttpClient::new(&config)?),
        })
    }

    pub fn functions(&self) -> Functions {
        Functions::new(self.http.clone())
    }

    pub fn indexes(&self) -> Indexes {
        Indexes::new(self.http.clone())
    }

    pub fn spans(&self) -> Spans {
        Spans::new(self.http.clone())
    }
}
