use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::OpperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// A user message carrying a typed input.
    ///
    /// Strings are sent verbatim; every other value is sent as its JSON text.
    pub fn from_input<I: Serialize + ?Sized>(input: &I) -> Result<Self, OpperError> {
        let value = serde_json::to_value(input).map_err(|e| OpperError::Parse {
            message: "Failed to serialize function input".to_string(),
            source: Box::new(e),
        })?;

        let content = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(Message::user(content))
    }
}

/// An input/output pair shown to the model for a single call.
///
/// Examples are sent with the call and never stored on the function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: Value,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Example {
    pub fn new<I, O>(input: &I, output: &O) -> Result<Self, OpperError>
    where
        I: Serialize + ?Sized,
        O: Serialize + ?Sized,
    {
        let to_value = |v: Result<Value, serde_json::Error>| {
            v.map_err(|e| OpperError::Parse {
                message: "Failed to serialize example".to_string(),
                source: Box::new(e),
            })
        };

        Ok(Self {
            input: to_value(serde_json::to_value(input))?,
            output: to_value(serde_json::to_value(output))?,
            comment: None,
        })
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Everything about a call except the parsed output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Whether the server answered from its exact-match cache.
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub span_id: Option<String>,
    /// Free-text answer, set when the function has no output schema.
    #[serde(default)]
    pub message: Option<String>,
    /// Retrieval context the server used, if any.
    #[serde(default)]
    pub context: Option<Value>,
}

/// One fragment of a streamed response, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Text(String),
    /// A partially complete structured value.
    Partial(Value),
}

impl Delta {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Delta::Text(text) => Some(text),
            Delta::Partial(_) => None,
        }
    }
}

impl std::fmt::Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delta::Text(text) => f.write_str(text),
            Delta::Partial(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Greeting {
        name: String,
    }

    #[test]
    fn test_string_input_is_sent_verbatim() {
        let message = Message::from_input("hello").unwrap();
        assert_eq!(message.role, ChatRole::User);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn test_structured_input_is_sent_as_json() {
        let message = Message::from_input(&Greeting {
            name: "world".into(),
        })
        .unwrap();
        assert_eq!(message.content, r#"{"name":"world"}"#);
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let value = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(value, json!({ "role": "assistant", "content": "hi" }));
    }

    #[test]
    fn test_example_skips_empty_comment() {
        let example = Example::new(&Greeting { name: "nick".into() }, "Hello, nick!").unwrap();
        let value = serde_json::to_value(&example).unwrap();
        assert_eq!(
            value,
            json!({ "input": { "name": "nick" }, "output": "Hello, nick!" })
        );

        let value = serde_json::to_value(example.with_comment("casual")).unwrap();
        assert_eq!(value["comment"], "casual");
    }

    #[test]
    fn test_metadata_defaults_when_fields_missing() {
        let metadata: ResponseMetadata = serde_json::from_value(json!({})).unwrap();
        assert!(!metadata.cached);
        assert!(metadata.span_id.is_none());
    }
}
