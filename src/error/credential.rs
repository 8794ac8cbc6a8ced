use thiserror::Error as ThisError;

use super::{IsRetryable, OauthError};

/// Errors from the credential/project/onboarding subsystem (§4.2-§4.5).
#[derive(Debug, ThisError)]
pub enum CredentialError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("credential has no refresh token")]
    NoRefreshToken,

    #[error("could not discover a Google Cloud project id")]
    ProjectUndiscoverable,

    #[error("onboarding tier requires a user-defined project")]
    ProjectRequired,

    #[error("onboarding failed: {0}")]
    OnboardingFailed(String),

    #[error("onboarding timed out")]
    OnboardingTimeout,

    #[error("no credential is currently loaded")]
    Unloaded,

    #[error(transparent)]
    Oauth(#[from] OauthError),

    #[error("credential file io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IsRetryable for CredentialError {
    fn is_retryable(&self) -> bool {
        matches!(self, CredentialError::Oauth(e) if e.is_retryable())
    }
}
