//! Remote functions: management, calls and streaming.

mod client;
mod definition;
mod request;
pub(crate) mod stream;

pub use client::{FunctionHandle, Functions};
pub use definition::{FunctionDefinition, TypedFunction};
pub use request::{CallOptions, FunctionResponse, FunctionSpec, FunctionUpdate, json_schema_for};
pub use stream::StreamingResponse;
