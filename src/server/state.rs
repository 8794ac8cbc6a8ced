//! Gateway application state (§4.1, §5): the process-wide shared pieces a
//! single request needs — credentials, project resolution, onboarding, and
//! the pooled upstream HTTP client.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::credentials::{CredentialStore, Onboarder, ProjectResolver};
use crate::error::GatewayError;
use crate::transport;

const UPSTREAM_BASE: &str = "https://cloudcode-pa.googleapis.com/v1internal";

#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub credentials: Arc<CredentialStore>,
    pub projects: Arc<ProjectResolver>,
    pub onboarder: Arc<Onboarder>,
    pub http: reqwest::Client,
}

impl GatewayState {
    pub async fn new(config: GatewayConfig) -> Self {
        let http = transport::build_client(&config.transport, config.proxy.as_ref());
        let credentials = Arc::new(CredentialStore::new(config.credentials_path.clone()));
        if let Err(error) = credentials.load().await {
            tracing::warn!(%error, "starting without a usable credential loaded at startup");
        }
        let projects = Arc::new(ProjectResolver::new(config.project_override.clone()));
        let onboarder = Arc::new(Onboarder::new(
            Duration::from_millis(config.transport.onboarding_poll_interval_ms),
            Duration::from_secs(config.transport.onboarding_max_wait_secs),
        ));

        GatewayState {
            config: Arc::new(config),
            credentials,
            projects,
            onboarder,
            http,
        }
    }

    /// Ensures the active credential is valid, its project resolved, and
    /// onboarding complete; returns `(access_token, project_id)` ready to use
    /// in an upstream call (§4.1 dispatcher precondition chain).
    pub async fn prepare(&self) -> Result<(String, String), GatewayError> {
        let record = self.credentials.active().await?;
        let access_token = record
            .access_token
            .clone()
            .ok_or(crate::error::CredentialError::Unloaded)?;
        let project_id = self.projects.resolve(&self.http, &self.credentials).await?;
        self.onboarder
            .ensure_onboarded(&self.http, &access_token, &project_id)
            .await?;
        Ok((access_token, project_id))
    }

    pub fn upstream_url(&self, action: &str) -> String {
        format!("{UPSTREAM_BASE}:{action}")
    }
}
