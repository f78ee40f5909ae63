use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::OpperError;

/// One retrieval hit returned by an index query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResponse {
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// A unit of indexed content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    uuid: Option<Uuid>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    metadata: Option<HashMap<String, Value>>,
}

impl TryFrom<RawDocument> for Document {
    type Error = OpperError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let mut document = Document {
            id: raw.id,
            uuid: raw.uuid,
            key: raw.key,
            content: None,
            metadata: raw.metadata,
        };
        if let Some(content) = raw.content {
            document = document.with_content(content)?;
        }
        Ok(document)
    }
}

impl Document {
    pub fn new(content: impl Into<String>) -> Result<Self, OpperError> {
        Document::default().with_content(content)
    }

    /// Sets the content; empty content is rejected.
    pub fn with_content(mut self, content: impl Into<String>) -> Result<Self, OpperError> {
        let content = content.into();
        if content.is_empty() {
            return Err(OpperError::invalid_argument(
                "content",
                "must contain at least one character",
            ));
        }
        self.content = Some(content);
        Ok(self)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// A named container of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "in")]
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
            FilterOp::In => "in",
        }
    }
}

impl FromStr for FilterOp {
    type Err = OpperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(FilterOp::Eq),
            "!=" => Ok(FilterOp::NotEq),
            ">" => Ok(FilterOp::Gt),
            "<" => Ok(FilterOp::Lt),
            "in" => Ok(FilterOp::In),
            other => Err(OpperError::invalid_argument(
                "operation",
                format!("`{other}` is not one of =, !=, >, <, in"),
            )),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

macro_rules! impl_filter_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Scalar(value.into())
                }
            }

            impl From<Vec<$ty>> for FilterValue {
                fn from(values: Vec<$ty>) -> Self {
                    FilterValue::List(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_filter_value_from!(&str, String, i64, f64);

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<Vec<Scalar>> for FilterValue {
    fn from(values: Vec<Scalar>) -> Self {
        FilterValue::List(values)
    }
}

/// Constrains an index query on a metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub operation: FilterOp,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(
        key: impl Into<String>,
        operation: FilterOp,
        value: impl Into<FilterValue>,
    ) -> Result<Self, OpperError> {
        let value = value.into();
        match (&operation, &value) {
            (FilterOp::In, FilterValue::Scalar(_)) => {
                return Err(OpperError::invalid_argument(
                    "value",
                    "the `in` operation requires a list",
                ));
            }
            (FilterOp::Gt | FilterOp::Lt, FilterValue::List(_)) => {
                return Err(OpperError::invalid_argument(
                    "value",
                    format!("the `{operation}` operation requires a single value"),
                ));
            }
            _ => {}
        }

        Ok(Self {
            key: key.into(),
            operation,
            value,
        })
    }

    /// Like [`Filter::new`], with the operation given as text (`"="`, `"in"`, ...).
    pub fn parse(
        key: impl Into<String>,
        operation: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self, OpperError> {
        Filter::new(key, operation.parse()?, value)
    }
}
