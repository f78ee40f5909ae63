use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum OpperError {
    /// Client-side misuse of parameters, reported before any request is sent.
    #[error("Invalid argument `{parameter}`: {message}")]
    InvalidArgument { parameter: String, message: String },

    /// The returned payload does not deserialize into the declared output type.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The server rejected the request payload (400/422).
    #[error("Server validation error ({status_code}): {message}")]
    ServerValidation { message: String, status_code: u16 },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The server reported an error in the middle of a streamed response.
    #[error("Stream error: {message}")]
    Stream { message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl OpperError {
    pub(crate) fn invalid_argument(parameter: &str, message: impl Into<String>) -> Self {
        OpperError::InvalidArgument {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status reported by the server, when the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OpperError::ServerValidation { status_code, .. } => Some(*status_code),
            OpperError::Conflict { .. } => Some(409),
            OpperError::NotFound { .. } => Some(404),
            OpperError::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OpperError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_parameter() {
        let err = OpperError::invalid_argument("score", "must be within [0, 1]");
        assert_eq!(
            err.to_string(),
            "Invalid argument `score`: must be within [0, 1]"
        );
    }

    #[test]
    fn test_status_code_mapping() {
        let conflict = OpperError::Conflict {
            message: "exists".into(),
        };
        assert_eq!(conflict.status_code(), Some(409));

        let validation = OpperError::ServerValidation {
            message: "bad".into(),
            status_code: 422,
        };
        assert_eq!(validation.status_code(), Some(422));

        let config = OpperError::Configuration("missing key".into());
        assert_eq!(config.status_code(), None);
        assert!(!config.is_not_found());
    }
}
