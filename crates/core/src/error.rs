/// Errors at the upload boundary: raw text that cannot be turned into a
/// state diagram.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level field is absent.
    #[error("diagram missing required field: '{field}'")]
    MissingField { field: String },

    /// A top-level field is present but has the wrong shape.
    #[error("diagram field '{field}' is invalid: {message}")]
    InvalidField { field: String, message: String },

    /// A state could not be read as a typed `State`.
    #[error("state '{state_id}' is malformed: {message}")]
    InvalidState { state_id: String, message: String },
}

impl ParseError {
    pub(crate) fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ParseError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
