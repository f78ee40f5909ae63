use std::fmt;
use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::client::FunctionHandle;
use super::request::{CallOptions, FunctionSpec, FunctionUpdate, json_schema_for};
use super::stream::StreamingResponse;
use crate::core::{OpperError, ResponseMetadata};
use crate::types::{FunctionConfiguration, FunctionInfo};

/// A typed description of a remote function, mapping `I` to `O`.
///
/// Schemas are derived once from the types. Pass the definition to
/// [`Functions::ensure`](super::Functions::ensure) to obtain a callable
/// [`TypedFunction`].
///
/// ```no_run
/// use opperai::{FunctionDefinition, Opper, ApiKey};
/// # async fn run() -> Result<(), opperai::OpperError> {
/// let translate = FunctionDefinition::<String, String>::new("sdk/translate")
///     .instructions("Translate the input to German");
/// let client = Opper::new(ApiKey::Default)?;
/// let function = client.functions().ensure(&translate).await?;
/// let (german, _) = function.call(&"Good morning".to_string()).await?;
/// # Ok(()) }
/// ```
pub struct FunctionDefinition<I, O> {
    name: String,
    instructions: String,
    description: Option<String>,
    model: Option<String>,
    configuration: Option<FunctionConfiguration>,
    input_schema: Value,
    output_schema: Value,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O> FunctionDefinition<I, O>
where
    I: JsonSchema,
    O: JsonSchema,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: String::new(),
            description: None,
            model: None,
            configuration: None,
            input_schema: json_schema_for::<I>(),
            output_schema: json_schema_for::<O>(),
            _types: PhantomData,
        }
    }
}

impl<I, O> FunctionDefinition<I, O> {
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn configuration(mut self, configuration: FunctionConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_spec(&self) -> FunctionSpec {
        FunctionSpec {
            path: self.name.clone(),
            instructions: self.instructions.clone(),
            description: self.description.clone(),
            model: self.model.clone(),
            input_schema: Some(self.input_schema.clone()),
            output_schema: Some(self.output_schema.clone()),
            configuration: self.configuration.clone(),
        }
    }

    /// The update that brings `stored` in line with this definition.
    ///
    /// Fields this definition leaves unset (model, description, configuration)
    /// are not compared.
    pub(crate) fn changes_from(&self, stored: &FunctionInfo) -> FunctionUpdate {
        fn differs<T: PartialEq>(wanted: &T, stored: Option<&T>) -> bool {
            stored != Some(wanted)
        }

        let mut update = FunctionUpdate::new();
        if differs(&self.instructions, stored.instructions.as_ref()) {
            update.instructions = Some(self.instructions.clone());
        }
        if let Some(description) = &self.description
            && differs(description, stored.description.as_ref())
        {
            update.description = Some(description.clone());
        }
        if let Some(model) = &self.model
            && differs(model, stored.model.as_ref())
        {
            update.model = Some(model.clone());
        }
        if differs(&self.input_schema, stored.input_schema.as_ref()) {
            update.input_schema = Some(self.input_schema.clone());
        }
        if differs(&self.output_schema, stored.out_schema.as_ref()) {
            update.output_schema = Some(self.output_schema.clone());
        }
        if let Some(configuration) = &self.configuration
            && differs(configuration, stored.configuration.as_ref())
        {
            update.configuration = Some(configuration.clone());
        }
        update
    }
}

impl<I, O> Clone for FunctionDefinition<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            instructions: self.instructions.clone(),
            description: self.description.clone(),
            model: self.model.clone(),
            configuration: self.configuration.clone(),
            input_schema: self.input_schema.clone(),
            output_schema: self.output_schema.clone(),
            _types: PhantomData,
        }
    }
}

impl<I, O> fmt::Debug for FunctionDefinition<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("input", &std::any::type_name::<I>())
            .field("output", &std::any::type_name::<O>())
            .finish_non_exhaustive()
    }
}

/// A remote function bound to its input and output types.
pub struct TypedFunction<I, O> {
    handle: FunctionHandle,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O> TypedFunction<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    pub async fn call(&self, input: &I) -> Result<(O, ResponseMetadata), OpperError> {
        self.handle.call(input, CallOptions::default()).await
    }

    pub async fn call_with(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<(O, ResponseMetadata), OpperError> {
        self.handle.call(input, options).await
    }

    pub async fn call_stream(
        &self,
        input: &I,
        options: CallOptions,
    ) -> Result<StreamingResponse, OpperError> {
        self.handle.call_stream(input, options).await
    }
}

impl<I, O> TypedFunction<I, O> {
    pub(crate) fn new(handle: FunctionHandle) -> Self {
        Self {
            handle,
            _types: PhantomData,
        }
    }

    pub fn handle(&self) -> &FunctionHandle {
        &self.handle
    }

    pub fn into_handle(self) -> FunctionHandle {
        self.handle
    }
}

impl<I, O> Clone for TypedFunction<I, O> {
    fn clone(&self) -> Self {
        Self::new(self.handle.clone())
    }
}

impl<I, O> fmt::Debug for TypedFunction<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedFunction")
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(JsonSchema, Serialize, Deserialize)]
    struct Question {
        text: String,
    }

    #[derive(JsonSchema, Serialize, Deserialize)]
    struct Answer {
        answer: String,
    }

    fn definition() -> FunctionDefinition<Question, Answer> {
        FunctionDefinition::new("sdk/answer")
            .instructions("Answer the question")
            .model("openai/gpt-4o")
    }

    fn stored(definition: &FunctionDefinition<Question, Answer>) -> FunctionInfo {
        let spec = definition.to_spec();
        FunctionInfo {
            id: 1,
            path: spec.path,
            description: None,
            instructions: Some(spec.instructions),
            model: spec.model,
            input_schema: spec.input_schema,
            out_schema: spec.output_schema,
            configuration: None,
        }
    }

    #[test]
    fn test_spec_carries_both_schemas() {
        let spec = definition().to_spec();
        assert_eq!(spec.path, "sdk/answer");
        assert!(spec.input_schema.unwrap()["properties"]["text"].is_object());
        assert!(spec.output_schema.unwrap()["properties"]["answer"].is_object());
    }

    #[test]
    fn test_matching_stored_function_needs_no_update() {
        let definition = definition();
        assert!(definition.changes_from(&stored(&definition)).is_empty());
    }

    #[test]
    fn test_drifted_fields_are_updated() {
        let definition = definition();
        let mut info = stored(&definition);
        info.instructions = Some("Old instructions".into());
        info.model = Some("openai/gpt-3.5".into());

        let update = definition.changes_from(&info);
        assert_eq!(update.instructions.as_deref(), Some("Answer the question"));
        assert_eq!(update.model.as_deref(), Some("openai/gpt-4o"));
        assert!(update.input_schema.is_none());
        assert!(update.configuration.is_none());
    }

    #[test]
    fn test_unset_model_is_not_compared() {
        let definition = FunctionDefinition::<Question, Answer>::new("sdk/answer")
            .instructions("Answer the question");
        let mut info = stored(&definition);
        info.model = Some("server/default".into());
        assert!(definition.changes_from(&info).is_empty());
    }
}
