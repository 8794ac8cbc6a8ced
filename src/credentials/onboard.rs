//! Onboarder (§4.5): ensures the active `(credential, project)` pair has
//! completed Code Assist onboarding once per process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::info;

use crate::error::CredentialError;

use super::oauth::ONBOARD_CODE_ASSIST_URL;
use super::project::{client_metadata, load_code_assist};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum UserTier {
    #[serde(rename = "free-tier")]
    Free,
    #[serde(rename = "legacy-tier")]
    Legacy,
    #[serde(rename = "standard-tier")]
    Standard,
    #[serde(other)]
    Unknown,
}

impl UserTier {
    fn id(self) -> &'static str {
        match self {
            UserTier::Free => "free-tier",
            UserTier::Legacy => "legacy-tier",
            UserTier::Standard | UserTier::Unknown => "standard-tier",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct TierInfo {
    id: String,
    #[serde(default)]
    is_default: bool,
    #[serde(default)]
    user_defined_cloudaicompanion_project: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct LoadCodeAssistResponse {
    current_tier: Option<Value>,
    #[serde(default)]
    allowed_tiers: Vec<TierInfo>,
}

/// Tracks whether onboarding has completed, keyed by `(credential identity,
/// project)` pair so a project switch (rare, but possible via env override
/// changes between requests) re-triggers the check.
#[derive(Clone)]
pub struct Onboarder {
    poll_interval: Duration,
    max_wait: Duration,
    onboarded: Arc<RwLock<Option<String>>>,
}

impl Onboarder {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Onboarder {
            poll_interval,
            max_wait,
            onboarded: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn ensure_onboarded(
        &self,
        client: &reqwest::Client,
        access_token: &str,
        project_id: &str,
    ) -> Result<(), CredentialError> {
        if self.onboarded.read().await.as_deref() == Some(project_id) {
            return Ok(());
        }

        let body = load_code_assist(client, access_token).await?;
        let parsed: LoadCodeAssistResponse = serde_json::from_value(body)
            .map_err(|e| CredentialError::OnboardingFailed(e.to_string()))?;

        if parsed.current_tier.is_some() {
            info!(project = %project_id, "already onboarded");
            *self.onboarded.write().await = Some(project_id.to_string());
            return Ok(());
        }

        let tier = parsed
            .allowed_tiers
            .iter()
            .find(|t| t.is_default)
            .map(|t| tier_from_id(&t.id))
            .unwrap_or(UserTier::Legacy);

        let requires_project = parsed
            .allowed_tiers
            .iter()
            .find(|t| tier_from_id(&t.id) == tier)
            .map(|t| t.user_defined_cloudaicompanion_project)
            .unwrap_or(false);

        if requires_project && project_id.is_empty() {
            return Err(CredentialError::ProjectRequired);
        }

        let payload = onboard_payload(tier, project_id);
        self.poll_until_done(client, access_token, &payload).await?;

        info!(project = %project_id, tier = tier.id(), "onboarding completed");
        *self.onboarded.write().await = Some(project_id.to_string());
        Ok(())
    }

    /// Reposts the onboarding payload in a loop until the long-running
    /// operation reports `done`, matching the upstream client's retry shape
    /// (it has no distinct operation-name poll; onboarding is itself an
    /// idempotent repost of the same request).
    async fn poll_until_done(
        &self,
        client: &reqwest::Client,
        access_token: &str,
        payload: &Value,
    ) -> Result<(), CredentialError> {
        let deadline = Instant::now() + self.max_wait;
        loop {
            let resp = client
                .post(ONBOARD_CODE_ASSIST_URL)
                .bearer_auth(access_token)
                .json(payload)
                .send()
                .await
                .map_err(|e| CredentialError::OnboardingFailed(e.to_string()))?;

            if !resp.status().is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(CredentialError::OnboardingFailed(body));
            }

            let body: Value = resp
                .json()
                .await
                .map_err(|e| CredentialError::OnboardingFailed(e.to_string()))?;

            if body.get("done").and_then(Value::as_bool).unwrap_or(false) {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(CredentialError::OnboardingTimeout);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn onboard_payload(tier: UserTier, project_id: &str) -> Value {
    let mut metadata: HashMap<String, Value> = HashMap::new();
    if let Value::Object(map) = client_metadata() {
        metadata.extend(map);
    }
    if !project_id.is_empty() {
        metadata.insert("duetProject".to_string(), Value::String(project_id.to_string()));
    }

    json!({
        "tierId": tier.id(),
        "cloudaicompanionProject": if project_id.is_empty() { None } else { Some(project_id) },
        "metadata": metadata,
    })
}

fn tier_from_id(id: &str) -> UserTier {
    match id {
        "free-tier" => UserTier::Free,
        "legacy-tier" => UserTier::Legacy,
        "standard-tier" => UserTier::Standard,
        _ => UserTier::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_id_maps_unknown_to_standard() {
        assert_eq!(UserTier::Unknown.id(), "standard-tier");
        assert_eq!(UserTier::Free.id(), "free-tier");
    }

    #[tokio::test]
    async fn already_onboarded_project_short_circuits() {
        let onboarder = Onboarder::new(Duration::from_millis(10), Duration::from_millis(50));
        *onboarder.onboarded.write().await = Some("proj-1".to_string());
        let client = reqwest::Client::new();
        assert!(
            onboarder
                .ensure_onboarded(&client, "token", "proj-1")
                .await
                .is_ok()
        );
    }
}
