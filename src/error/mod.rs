mod cli;
mod credential;
mod gateway;
mod oauth;
mod transport;
mod translate;

pub use cli::CliError;
pub use credential::CredentialError;
pub use gateway::{GatewayError, Schema};
pub use oauth::OauthError;
pub use transport::TransportError;
pub use translate::TranslateError;

/// Whether an error represents a condition the upstream transport's retry loop
/// should attempt again.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
