//! # opperai
//!
//! Client SDK for Opper: define typed functions once, let a model execute them
//! server-side, and get typed values back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opperai::{ApiKey, FunctionDefinition, Opper, schema};
//!
//! #[schema]
//! struct Room {
//!     beds: u32,
//!     sea_view: bool,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Opper::new(ApiKey::Default)?;
//!     let extract = FunctionDefinition::<String, Room>::new("sdk/extract_room")
//!         .instructions("Extract the room details from the description");
//!
//!     let function = client.functions().ensure(&extract).await?;
//!     let (room, meta) = function
//!         .call(&"Double room, two beds, facing the ocean".to_string())
//!         .await?;
//!     println!("{} beds, sea view: {} (cached: {})", room.beds, room.sea_view, meta.cached);
//!     Ok(())
//! }
//! ```
//!
//! Blocking code uses [`blocking::Opper`], which mirrors the async API.

pub mod blocking;
mod client;
mod constants;
pub mod core;
pub mod functions;
pub mod indexes;
pub mod spans;
pub mod types;

pub use client::Opper;
pub use crate::core::{
    ApiKey, ChatRole, ClientConfig, Delta, Example, FunctionRef, HttpClientConfig, IndexRef,
    Message, OpperError, ResponseMetadata,
};
pub use functions::{
    CallOptions, FunctionDefinition, FunctionHandle, FunctionResponse, FunctionSpec,
    FunctionUpdate, Functions, StreamingResponse, TypedFunction,
};
pub use indexes::{Indexes, Query};
pub use opperai_macros::{function, schema};
pub use spans::Spans;
pub use types::{
    Cache, Document, EventFeedback, Filter, FilterOp, FunctionConfiguration, FunctionInfo, Index,
    RetrievalResponse,
};

/// Re-exports used by code generated from `#[function]` and `#[schema]`.
#[doc(hidden)]
pub mod __private {
    pub use schemars;
    pub use serde;
}
