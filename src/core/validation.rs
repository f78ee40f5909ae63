//! Selectors for resources that can be addressed in two mutually exclusive ways.
//!
//! The typed API takes [`FunctionRef`] / [`IndexRef`] directly, so "neither" and
//! "both" cannot be expressed. The `from_parts` / `from_params` factories exist for
//! callers holding loose, optional parameters (configuration files, CLI flags,
//! JSON requests) and enforce the same rule at runtime.

use std::fmt;

use serde_json::{Map, Value};

use super::error::OpperError;

/// Which of the two designated parameters was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either {
    First,
    Second,
}

/// Require exactly one of `first` / `second` among `params`, rejecting any other key.
///
/// Keys whose value is `null` count as absent.
pub fn exactly_one(
    first: &str,
    second: &str,
    params: &Map<String, Value>,
) -> Result<Either, OpperError> {
    if let Some(extra) = params.keys().find(|key| *key != first && *key != second) {
        return Err(OpperError::invalid_argument(
            extra,
            format!("unexpected parameter; expected exactly one of `{first}` or `{second}`"),
        ));
    }

    let present = |name: &str| params.get(name).is_some_and(|value| !value.is_null());

    match (present(first), present(second)) {
        (true, false) => Ok(Either::First),
        (false, true) => Ok(Either::Second),
        (both, _) => Err(both_or_neither(first, second, both)),
    }
}

fn both_or_neither(first: &str, second: &str, both: bool) -> OpperError {
    if both {
        OpperError::invalid_argument(
            &format!("{first}|{second}"),
            format!("`{first}` and `{second}` are mutually exclusive"),
        )
    } else {
        OpperError::invalid_argument(
            &format!("{first}|{second}"),
            format!("one of `{first}` or `{second}` is required"),
        )
    }
}

/// Identifies a remote function by numeric id or by its path (name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionRef {
    ById(u64),
    ByPath(String),
}

impl FunctionRef {
    pub fn from_parts(id: Option<u64>, path: Option<String>) -> Result<Self, OpperError> {
        match (id, path) {
            (Some(id), None) => Ok(FunctionRef::ById(id)),
            (None, Some(path)) => FunctionRef::by_path(path),
            (id, _) => Err(both_or_neither("id", "path", id.is_some())),
        }
    }

    /// Build from a loose parameter map such as `{"id": 3}` or `{"path": "a/b"}`.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, OpperError> {
        match exactly_one("id", "path", params)? {
            Either::First => params["id"]
                .as_u64()
                .map(FunctionRef::ById)
                .ok_or_else(|| {
                    OpperError::invalid_argument("id", "must be a non-negative integer")
                }),
            Either::Second => match &params["path"] {
                Value::String(path) => FunctionRef::by_path(path.clone()),
                _ => Err(OpperError::invalid_argument("path", "must be a string")),
            },
        }
    }

    pub fn by_path(path: impl Into<String>) -> Result<Self, OpperError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(OpperError::invalid_argument("path", "must not be empty"));
        }
        Ok(FunctionRef::ByPath(path))
    }
}

impl From<u64> for FunctionRef {
    fn from(id: u64) -> Self {
        FunctionRef::ById(id)
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionRef::ById(id) => write!(f, "id={id}"),
            FunctionRef::ByPath(path) => write!(f, "path={path}"),
        }
    }
}

/// Identifies an index by numeric id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexRef {
    ById(u64),
    ByName(String),
}

impl IndexRef {
    pub fn from_parts(id: Option<u64>, name: Option<String>) -> Result<Self, OpperError> {
        match (id, name) {
            (Some(id), None) => Ok(IndexRef::ById(id)),
            (None, Some(name)) if !name.trim().is_empty() => Ok(IndexRef::ByName(name)),
            (None, Some(_)) => Err(OpperError::invalid_argument("name", "must not be empty")),
            (id, _) => Err(both_or_neither("id", "name", id.is_some())),
        }
    }

    pub fn from_params(params: &Map<String, Value>) -> Result<Self, OpperError> {
        match exactly_one("id", "name", params)? {
            Either::First => params["id"]
                .as_u64()
                .map(IndexRef::ById)
                .ok_or_else(|| {
                    OpperError::invalid_argument("id", "must be a non-negative integer")
                }),
            Either::Second => match &params["name"] {
                Value::String(name) => IndexRef::from_parts(None, Some(name.clone())),
                _ => Err(OpperError::invalid_argument("name", "must be a string")),
            },
        }
    }
}

impl From<u64> for IndexRef {
    fn from(id: u64) -> Self {
        IndexRef::ById(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_exactly_one_accepts_either_parameter() {
        assert_eq!(
            FunctionRef::from_params(&params(json!({ "id": 1 }))).unwrap(),
            FunctionRef::ById(1)
        );
        assert_eq!(
            FunctionRef::from_params(&params(json!({ "path": "test" }))).unwrap(),
            FunctionRef::ByPath("test".into())
        );
    }

    #[test]
    fn test_exactly_one_rejects_both() {
        let err =
            FunctionRef::from_params(&params(json!({ "id": 1, "path": "test" }))).unwrap_err();
        assert!(matches!(err, OpperError::InvalidArgument { .. }));
    }

    #[test]
    fn test_exactly_one_rejects_neither() {
        let err = FunctionRef::from_params(&Map::new()).unwrap_err();
        assert!(matches!(err, OpperError::InvalidArgument { .. }));

        // Explicit nulls behave like omitted parameters.
        let err =
            FunctionRef::from_params(&params(json!({ "id": null, "path": null }))).unwrap_err();
        assert!(matches!(err, OpperError::InvalidArgument { .. }));
    }

    #[test]
    fn test_exactly_one_rejects_unknown_extra_parameter() {
        let err = FunctionRef::from_params(&params(json!({
            "id": 1,
            "path": "test",
            "other": "other"
        })))
        .unwrap_err();
        match err {
            OpperError::InvalidArgument { parameter, .. } => assert_eq!(parameter, "other"),
            other => panic!("expected invalid argument, got {other:?}"),
        }

        // An extra parameter is rejected even when exactly one identifier is present.
        let err = FunctionRef::from_params(&params(json!({ "id": 1, "other": 2 }))).unwrap_err();
        assert!(matches!(err, OpperError::InvalidArgument { .. }));
    }

    #[test]
    fn test_from_parts_mirrors_params_rules() {
        assert_eq!(FunctionRef::from_parts(Some(7), None).unwrap(), FunctionRef::ById(7));
        assert_eq!(
            FunctionRef::from_parts(None, Some("a/b".into())).unwrap(),
            FunctionRef::ByPath("a/b".into())
        );
        assert!(FunctionRef::from_parts(None, None).is_err());
        assert!(FunctionRef::from_parts(Some(7), Some("a/b".into())).is_err());
        assert!(FunctionRef::from_parts(None, Some("  ".into())).is_err());
    }

    #[test]
    fn test_wrong_value_types_are_invalid_arguments() {
        let err = FunctionRef::from_params(&params(json!({ "id": "seven" }))).unwrap_err();
        assert!(
            matches!(err, OpperError::InvalidArgument { ref parameter, .. } if parameter == "id")
        );

        let err = IndexRef::from_params(&params(json!({ "name": 3 }))).unwrap_err();
        assert!(
            matches!(err, OpperError::InvalidArgument { ref parameter, .. } if parameter == "name")
        );
    }

    #[test]
    fn test_index_ref_selectors() {
        assert_eq!(
            IndexRef::from_params(&params(json!({ "name": "docs" }))).unwrap(),
            IndexRef::ByName("docs".into())
        );
        assert!(IndexRef::from_parts(Some(1), Some("docs".into())).is_err());
        assert!(IndexRef::from_parts(None, None).is_err());
    }
}
