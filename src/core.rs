pub mod config;
pub mod error;
pub mod http;
pub mod sse;
pub mod types;
pub mod validation;

pub use config::{ApiKey, ClientConfig, HttpClientConfig, InspectorConfig};
pub use error::OpperError;
pub use http::HttpClient;
pub use types::{ChatRole, Delta, Example, Message, ResponseMetadata};
pub use validation::{FunctionRef, IndexRef, exactly_one};
