use thiserror::Error as ThisError;

/// Translator errors (§4.7). Always caller-caused; never raised for internal
/// faults.
#[derive(Debug, ThisError)]
pub enum TranslateError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TranslateError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TranslateError::InvalidRequest(message.into())
    }
}
