//! Blocking wrappers over the async client.
//!
//! Each wrapper drives its async counterpart on a private current-thread tokio
//! runtime. They must not be used from inside an async runtime; `block_on` panics
//! there.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Serialize, de::DeserializeOwned};
use tokio::runtime::Runtime;

use crate::core::{
    ApiKey, ClientConfig, Delta, FunctionRef, IndexRef, Message, OpperError, ResponseMetadata,
};
use crate::functions::{
    self, CallOptions, FunctionDefinition, FunctionResponse, FunctionSpec, FunctionUpdate,
};
use crate::indexes::{self, Query};
use crate::spans;
use crate::types::{Document, EventFeedback, FunctionInfo, Index, RetrievalResponse};

/// Blocking counterpart of [`crate::Opper`].
#[derive(Clone)]
pub struct Opper {
    inner: crate::Opper,
    runtime: Arc<Runtime>,
}

impl fmt::Debug for Opper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opper").field("inner", &self.inner).finish_non_exhaustive()
    }
}

impl Opper {
    pub fn new(api_key: ApiKey) -> Result<Self, OpperError> {
        Self::with_config(ClientConfig::new(api_key)?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, OpperError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OpperError::Configuration(format!("Failed to start tokio runtime: {e}")))?;

        Ok(Self {
            inner: crate::Opper::with_config(config)?,
            runtime: Arc::new(runtime),
        })
    }

    pub fn functions(&self) -> Functions {
        Functions {
            inner: self.inner.functions(),
            runtime: self.runtime.clone(),
        }
    }

    pub fn indexes(&self) -> Indexes {
        Indexes {
            inner: self.inner.indexes(),
            runtime: self.runtime.clone(),
        }
    }

    pub fn spans(&self) -> Spans {
        Spans {
            inner: self.inner.spans(),
            runtime: self.runtime.clone(),
        }
    }
}

pub struct Functions {
    inner: functions::Functions,
    runtime: Arc<Runtime>,
}

impl Functions {
    pub fn create(&self, spec: FunctionSpec) -> Result<FunctionHandle, OpperError> {
        let handle = self.runtime.block_on(self.inner.create(spec))?;
        Ok(self.wrap(handle))
    }

    pub fn get(&self, function: FunctionRef) -> Result<FunctionHandle, OpperError> {
        let handle = self.runtime.block_on(self.inner.get(function))?;
        Ok(self.wrap(handle))
    }

    pub fn list(&self) -> Result<Vec<FunctionInfo>, OpperError> {
        self.runtime.block_on(self.inner.list())
    }

    pub fn delete(&self, function: FunctionRef) -> Result<bool, OpperError> {
        self.runtime.block_on(self.inner.delete(function))
    }

    pub fn ensure<I, O>(
        &self,
        definition: &FunctionDefinition<I, O>,
    ) -> Result<TypedFunction<I, O>, OpperError> {
        let inner = self.runtime.block_on(self.inner.ensure(definition))?;
        Ok(TypedFunction {
            inner,
            runtime: self.runtime.clone(),
        })
    }

    fn wrap(&self, inner: functions::FunctionHandle) -> FunctionHandle {
        FunctionHandle {
            inner,
            runtime: self.runtime.clone(),
        }
    }
}

#[derive(Clone)]
pub struct FunctionHandle {
    inner: functions::FunctionHandle,
    runtime: Arc<Runtime>,
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl FunctionHandle {
    pub fn info(&self) -> &FunctionInfo {
        self.inner.info()
    }

    pub fn id(&self) -> u64 {
        self.inner.id()
    }

    pub fn path(&self) -> &str {
        self.inner.path()
    }

    pub fn update(&mut self, update: FunctionUpdate) -> Result<&FunctionInfo, OpperError> {
        self.runtime.block_on(self.inner.update(update))
    }

    pub fn call<I, O>(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<(O, ResponseMetadata), OpperError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.runtime.block_on(self.inner.call(input, options))
    }

    pub fn call_stream<I>(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<StreamingResponse, OpperError>
    where
        I: Serialize + ?Sized,
    {
        let inner = self.runtime.block_on(self.inner.call_stream(input, options))?;
        Ok(StreamingResponse::new(inner, self.runtime.clone()))
    }

    pub fn chat(&self, messages: Vec<Message>) -> Result<FunctionResponse, OpperError> {
        self.runtime.block_on(self.inner.chat(messages))
    }

    pub fn chat_stream(&self, messages: Vec<Message>) -> Result<StreamingResponse, OpperError> {
        let inner = self.runtime.block_on(self.inner.chat_stream(messages))?;
        Ok(StreamingResponse::new(inner, self.runtime.clone()))
    }

    pub fn delete(&self) -> Result<bool, OpperError> {
        self.runtime.block_on(self.inner.delete())
    }
}

/// Blocking counterpart of [`crate::TypedFunction`].
pub struct TypedFunction<I, O> {
    inner: functions::TypedFunction<I, O>,
    runtime: Arc<Runtime>,
}

impl<I, O> TypedFunction<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    pub fn call(&self, input: &I) -> Result<(O, ResponseMetadata), OpperError> {
        self.runtime.block_on(self.inner.call(input))
    }

    pub fn call_with(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<(O, ResponseMetadata), OpperError> {
        self.runtime.block_on(self.inner.call_with(input, options))
    }

    pub fn call_stream(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<StreamingResponse, OpperError> {
        let inner = self.runtime.block_on(self.inner.call_stream(input, options))?;
        Ok(StreamingResponse::new(inner, self.runtime.clone()))
    }
}

impl<I, O> TypedFunction<I, O> {
    pub fn handle(&self) -> FunctionHandle {
        FunctionHandle {
            inner: self.inner.handle().clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<I, O> Clone for TypedFunction<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<I, O> fmt::Debug for TypedFunction<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

/// Blocking counterpart of [`crate::StreamingResponse`].
pub struct StreamingResponse {
    inner: functions::StreamingResponse,
    runtime: Arc<Runtime>,
}

impl StreamingResponse {
    fn new(inner: functions::StreamingResponse, runtime: Arc<Runtime>) -> Self {
        Self { inner, runtime }
    }

    /// Takes the deltas as an iterator. Every later call yields nothing.
    pub fn deltas(&mut self) -> Deltas {
        Deltas {
            stream: self.inner.deltas(),
            runtime: self.runtime.clone(),
        }
    }

    pub fn collect_text(&mut self) -> Result<String, OpperError> {
        self.runtime.block_on(self.inner.collect_text())
    }
}

/// Iterator over streamed deltas; each `next` blocks until a fragment arrives.
pub struct Deltas {
    stream: BoxStream<'static, Result<Delta, OpperError>>,
    runtime: Arc<Runtime>,
}

impl Iterator for Deltas {
    type Item = Result<Delta, OpperError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}

pub struct Indexes {
    inner: indexes::Indexes,
    runtime: Arc<Runtime>,
}

impl Indexes {
    pub fn create(&self, name: &str) -> Result<Index, OpperError> {
        self.runtime.block_on(self.inner.create(name))
    }

    pub fn get(&self, index: IndexRef) -> Result<Index, OpperError> {
        self.runtime.block_on(self.inner.get(index))
    }

    pub fn list(&self) -> Result<Vec<Index>, OpperError> {
        self.runtime.block_on(self.inner.list())
    }

    pub fn delete(&self, id: u64) -> Result<bool, OpperError> {
        self.runtime.block_on(self.inner.delete(id))
    }

    pub fn add(&self, id: u64, document: Document) -> Result<Document, OpperError> {
        self.runtime.block_on(self.inner.add(id, document))
    }

    pub fn query(&self, id: u64, query: Query) -> Result<Vec<RetrievalResponse>, OpperError> {
        self.runtime.block_on(self.inner.query(id, query))
    }
}

pub struct Spans {
    inner: spans::Spans,
    runtime: Arc<Runtime>,
}

impl Spans {
    pub fn save_feedback(&self, span_id: &str, feedback: EventFeedback) -> Result<(), OpperError> {
        self.runtime.block_on(self.inner.save_feedback(span_id, feedback))
    }
}
