use thiserror::Error as ThisError;

use super::{CredentialError, OauthError};

/// Errors surfaced by the `auth` subcommand group (§4.12).
#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OAuth callback returned an error: {0}")]
    CallbackDenied(String),

    #[error("OAuth callback timed out waiting for a redirect")]
    CallbackTimeout,

    #[error("CSRF state mismatch between authorize request and callback")]
    CsrfMismatch,

    #[error(transparent)]
    Oauth(#[from] OauthError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("credential '{0}' not found")]
    NotFound(String),

    #[error("credential json error: {0}")]
    Json(#[from] serde_json::Error),
}
