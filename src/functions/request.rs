use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::core::{Example, Message, OpperError, ResponseMetadata};
use crate::types::FunctionConfiguration;

/// JSON schema of `T`, as sent to the server for input/output types.
pub fn json_schema_for<T: JsonSchema + ?Sized>() -> Value {
    schema_for!(T).to_value()
}

/// Everything needed to register a new remote function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub path: String,
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(rename = "out_schema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<FunctionConfiguration>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            path: name.into(),
            instructions: instructions.into(),
            description: None,
            model: None,
            input_schema: None,
            output_schema: None,
            configuration: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Model identifier such as `openai/gpt-4o`; the server default is used when unset.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn input_type<I: JsonSchema + ?Sized>(mut self) -> Self {
        self.input_schema = Some(json_schema_for::<I>());
        self
    }

    pub fn output_type<O: JsonSchema + ?Sized>(mut self) -> Self {
        self.output_schema = Some(json_schema_for::<O>());
        self
    }

    pub fn configuration(mut self, configuration: FunctionConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), OpperError> {
        if self.path.trim().is_empty() {
            return Err(OpperError::invalid_argument("name", "must not be empty"));
        }
        if self.instructions.trim().is_empty() {
            return Err(OpperError::invalid_argument(
                "instructions",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// A partial update; fields left as `None` are not sent and stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(rename = "out_schema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<FunctionConfiguration>,
}

impl FunctionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
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

    pub fn input_type<I: JsonSchema + ?Sized>(mut self) -> Self {
        self.input_schema = Some(json_schema_for::<I>());
        self
    }

    pub fn output_type<O: JsonSchema + ?Sized>(mut self) -> Self {
        self.output_schema = Some(json_schema_for::<O>());
        self
    }

    pub fn configuration(mut self, configuration: FunctionConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub examples: Vec<Example>,
    pub parent_span_id: Option<String>,
}

impl CallOptions {
    pub fn example(mut self, example: Example) -> Self {
        self.examples.push(example);
        self
    }

    pub fn examples(mut self, examples: impl IntoIterator<Item = Example>) -> Self {
        self.examples.extend(examples);
        self
    }

    pub fn parent_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(span_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, options: CallOptions) -> Self {
        Self {
            messages,
            examples: options.examples,
            parent_span_id: options.parent_span_id,
        }
    }
}

/// The server's answer to a call or chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub json_payload: Option<Value>,
    #[serde(default)]
    pub span_id: Option<String>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub context: Option<Value>,
}

impl FunctionResponse {
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata {
            cached: self.cached,
            span_id: self.span_id.clone(),
            message: self.message.clone(),
            context: self.context.clone(),
        }
    }

    /// Decode the output as `O`.
    ///
    /// The structured payload is used when present; otherwise the text message is
    /// decoded, which is what functions without an output schema return.
    pub fn parse<O: DeserializeOwned>(&self) -> Result<O, OpperError> {
        let payload = match (&self.json_payload, &self.message) {
            (Some(payload), _) if !payload.is_null() => payload.clone(),
            (_, Some(message)) => Value::String(message.clone()),
            _ => Value::Null,
        };

        serde_json::from_value(payload).map_err(|e| OpperError::SchemaMismatch {
            message: format!(
                "Response does not match the declared output type `{}`: {e}",
                std::any::type_name::<O>()
            ),
            source: Some(Box::new(e)),
        })
    }
}
