//! Credential acquisition, storage, project resolution, and onboarding
//! (§3, §4.2-§4.5). Everything the dispatcher needs to turn a bare request
//! into an authenticated, project-scoped upstream call lives here.

mod onboard;
mod oauth;
mod project;
mod record;
mod store;

pub use oauth::OauthManager;
pub use onboard::{Onboarder, UserTier};
pub use project::ProjectResolver;
pub use record::{CredentialRecord, CredentialState, default_scopes};
pub use store::CredentialStore;
