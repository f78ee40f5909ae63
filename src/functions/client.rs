use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use super::definition::{FunctionDefinition, TypedFunction};
use super::request::{CallOptions, ChatRequest, FunctionResponse, FunctionSpec, FunctionUpdate};
use super::stream::StreamingResponse;
use crate::constants::functions::{
    BY_PATH_SEGMENT, CHAT_ENDPOINT, FUNCTIONS_ENDPOINT, STREAM_QUERY,
};
use crate::core::{FunctionRef, HttpClient, Message, OpperError, ResponseMetadata};
use crate::types::FunctionInfo;

/// Management of remote functions. Obtained from [`crate::Opper::functions`].
#[derive(Debug, Clone)]
pub struct Functions {
    http: Arc<HttpClient>,
}

#[derive(Deserialize)]
struct Created {
    id: u64,
}

impl Functions {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Registers a new function. A function with the same path yields `Conflict`.
    #[tracing::instrument(skip(self, spec), fields(path = %spec.path), err)]
    pub async fn create(&self, spec: FunctionSpec) -> Result<FunctionHandle, OpperError> {
        spec.validate()?;
        let created: Created = self.http.post_json(FUNCTIONS_ENDPOINT, &spec).await?;
        debug!(id = created.id, "Function created");

        let info = FunctionInfo {
            id: created.id,
            path: spec.path,
            description: spec.description,
            instructions: Some(spec.instructions),
            model: spec.model,
            input_schema: spec.input_schema,
            out_schema: spec.output_schema,
            configuration: spec.configuration,
        };
        Ok(FunctionHandle::new(self.http.clone(), info))
    }

    #[tracing::instrument(skip(self), fields(function = %function), err)]
    pub async fn get(&self, function: FunctionRef) -> Result<FunctionHandle, OpperError> {
        let info: FunctionInfo = self.http.get_json(&function_path(&function)?).await?;
        Ok(FunctionHandle::new(self.http.clone(), info))
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn list(&self) -> Result<Vec<FunctionInfo>, OpperError> {
        self.http.get_json(FUNCTIONS_ENDPOINT).await
    }

    /// Returns `false` when no such function existed.
    #[tracing::instrument(skip(self), fields(function = %function), err)]
    pub async fn delete(&self, function: FunctionRef) -> Result<bool, OpperError> {
        let id = match function {
            FunctionRef::ById(id) => id,
            FunctionRef::ByPath(_) => match self.get(function).await {
                Ok(handle) => handle.id(),
                Err(OpperError::NotFound { .. }) => return Ok(false),
                Err(e) => return Err(e),
            },
        };
        self.http.delete(&format!("{FUNCTIONS_ENDPOINT}/{id}")).await
    }

    /// Returns a typed handle for `definition`, creating the function when it does
    /// not exist yet and updating it when its stored definition has drifted.
    #[tracing::instrument(skip(self, definition), fields(path = %definition.name()), err)]
    pub async fn ensure<I, O>(
        &self,
        definition: &FunctionDefinition<I, O>,
    ) -> Result<TypedFunction<I, O>, OpperError> {
        let existing = self.get(FunctionRef::by_path(definition.name())?).await;
        let handle = match existing {
            Ok(mut handle) => {
                let update = definition.changes_from(handle.info());
                if !update.is_empty() {
                    debug!(id = handle.id(), "Stored definition differs, updating");
                    handle.update(update).await?;
                }
                handle
            }
            Err(OpperError::NotFound { .. }) => self.create(definition.to_spec()).await?,
            Err(e) => return Err(e),
        };

        Ok(TypedFunction::new(handle))
    }
}

fn function_path(function: &FunctionRef) -> Result<String, OpperError> {
    Ok(match function {
        FunctionRef::ById(id) => format!("{FUNCTIONS_ENDPOINT}/{id}"),
        FunctionRef::ByPath(path) => {
            let path = HttpClient::encode_path(path)?;
            format!("{FUNCTIONS_ENDPOINT}{BY_PATH_SEGMENT}/{path}")
        }
    })
}

/// A handle on one remote function, holding its last-known definition.
#[derive(Debug, Clone)]
pub struct FunctionHandle {
    http: Arc<HttpClient>,
    info: FunctionInfo,
}

impl FunctionHandle {
    pub(crate) fn new(http: Arc<HttpClient>, info: FunctionInfo) -> Self {
        Self { http, info }
    }

    pub fn info(&self) -> &FunctionInfo {
        &self.info
    }

    pub fn id(&self) -> u64 {
        self.info.id
    }

    pub fn path(&self) -> &str {
        &self.info.path
    }

    /// Applies a partial update and refreshes the local projection.
    #[tracing::instrument(skip(self, update), fields(id = self.info.id), err)]
    pub async fn update(&mut self, update: FunctionUpdate) -> Result<&FunctionInfo, OpperError> {
        let _: Value = self
            .http
            .patch_json(&format!("{FUNCTIONS_ENDPOINT}/{}", self.info.id), &update)
            .await?;

        let FunctionUpdate {
            description,
            instructions,
            model,
            input_schema,
            output_schema,
            configuration,
        } = update;
        let info = &mut self.info;
        if description.is_some() {
            info.description = description;
        }
        if instructions.is_some() {
            info.instructions = instructions;
        }
        if model.is_some() {
            info.model = model;
        }
        if input_schema.is_some() {
            info.input_schema = input_schema;
        }
        if output_schema.is_some() {
            info.out_schema = output_schema;
        }
        if configuration.is_some() {
            info.configuration = configuration;
        }
        Ok(&self.info)
    }

    /// Runs the function on `input` and decodes the output as `O`.
    #[tracing::instrument(skip(self, input, options), fields(path = %self.info.path), err)]
    pub async fn call<I, O>(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<(O, ResponseMetadata), OpperError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let response = self.send_chat(vec![Message::from_input(input)?], options).await?;
        let output = response.parse::<O>()?;
        Ok((output, response.metadata()))
    }

    #[tracing::instrument(skip(self, input, options), fields(path = %self.info.path), err)]
    pub async fn call_stream<I>(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<StreamingResponse, OpperError>
    where
        I: Serialize + ?Sized,
    {
        self.open_stream(vec![Message::from_input(input)?], options)
            .await
    }

    /// Sends a full conversation and returns the raw response.
    #[tracing::instrument(
        skip(self, messages),
        fields(path = %self.info.path, messages = messages.len()),
        err
    )]
    pub async fn chat(&self, messages: Vec<Message>) -> Result<FunctionResponse, OpperError> {
        self.send_chat(messages, CallOptions::default()).await
    }

    #[tracing::instrument(skip(self, messages), fields(path = %self.info.path), err)]
    pub async fn chat_stream(
        &self,
        messages: Vec<Message>,
    ) -> Result<StreamingResponse, OpperError> {
        self.open_stream(messages, CallOptions::default()).await
    }

    /// Deletes the remote function. Returns `false` when it was already gone.
    #[tracing::instrument(skip(self), fields(id = self.info.id), err)]
    pub async fn delete(&self) -> Result<bool, OpperError> {
        self.http
            .delete(&format!("{FUNCTIONS_ENDPOINT}/{}", self.info.id))
            .await
    }

    async fn send_chat(
        &self,
        messages: Vec<Message>,
        options: CallOptions,
    ) -> Result<FunctionResponse, OpperError> {
        let request = ChatRequest::new(messages, options);
        let path = HttpClient::encode_path(&self.info.path)?;
        let response: FunctionResponse = self
            .http
            .post_json(&format!("{CHAT_ENDPOINT}/{path}"), &request)
            .await?;
        debug!(cached = response.cached, span_id = ?response.span_id, "Function answered");
        Ok(response)
    }

    async fn open_stream(
        &self,
        messages: Vec<Message>,
        options: CallOptions,
    ) -> Result<StreamingResponse, OpperError> {
        let request = ChatRequest::new(messages, options);
        let path = HttpClient::encode_path(&self.info.path)?;
        let body = self
            .http
            .post_stream(&format!("{CHAT_ENDPOINT}/{path}{STREAM_QUERY}"), &request)
            .await?;
        Ok(StreamingResponse::from_bytes(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_path_by_id_and_by_path() {
        assert_eq!(
            function_path(&FunctionRef::ById(7)).unwrap(),
            "/api/v1/functions/7"
        );
        assert_eq!(
            function_path(&FunctionRef::ByPath("sdk/greet".into())).unwrap(),
            "/api/v1/functions/by_path/sdk/greet"
        );
    }

    #[test]
    fn test_function_path_encodes_reserved_characters() {
        assert_eq!(
            function_path(&FunctionRef::ByPath("sdk/what now?#x".into())).unwrap(),
            "/api/v1/functions/by_path/sdk/what%20now%3F%23x"
        );
    }
}
