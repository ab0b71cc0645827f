//! Serialization errors shared by every wire format.

/// Errors raised while reading or writing a wire document.
#[derive(Debug, thiserror::Error)]
pub enum ReadWriteError {
    /// A required value is absent.
    #[error("missing required value: {0}")]
    MissingValue(String),

    /// A value is present but cannot be converted to the target type.
    #[error("invalid value '{value}' for {target}")]
    InvalidValue {
        /// The raw text.
        value: String,
        /// The target type or field.
        target: String,
    },

    /// The document is not well-formed for its format.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The writer could not produce the document.
    #[error("failed to write document: {0}")]
    Write(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReadWriteError {
    /// Shorthand for [`ReadWriteError::InvalidValue`].
    pub fn invalid(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self::InvalidValue {
            value: value.into(),
            target: target.into(),
        }
    }
}
