//! Project Resolver (§4.4): decides which Google Cloud project id backs the
//! active credential, preferring cheap/local sources before calling upstream.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::CredentialError;

use super::oauth::LOAD_CODE_ASSIST_URL;
use super::store::CredentialStore;

#[derive(Clone)]
pub struct ProjectResolver {
    env_override: Option<String>,
    cached: Arc<RwLock<Option<String>>>,
}

impl ProjectResolver {
    pub fn new(env_override: Option<String>) -> Self {
        ProjectResolver {
            env_override,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Resolves a project id, trying env override, process cache, the
    /// credential's own `project_id`, then upstream discovery, in that order.
    pub async fn resolve(
        &self,
        client: &reqwest::Client,
        store: &CredentialStore,
    ) -> Result<String, CredentialError> {
        if let Some(project) = &self.env_override {
            return Ok(project.clone());
        }

        if let Some(project) = self.cached.read().await.clone() {
            return Ok(project);
        }

        let record = store.active().await?;
        if let Some(project) = record.project_id.clone() {
            *self.cached.write().await = Some(project.clone());
            return Ok(project);
        }

        let access_token = record.access_token.ok_or(CredentialError::Unloaded)?;
        let project = discover(client, &access_token).await?;

        info!(project = %project, "discovered project via loadCodeAssist");
        *self.cached.write().await = Some(project.clone());
        store.set_project_id(project.clone()).await;
        Ok(project)
    }
}

async fn discover(client: &reqwest::Client, access_token: &str) -> Result<String, CredentialError> {
    let body = load_code_assist(client, access_token).await?;
    body.get("cloudaicompanionProject")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(CredentialError::ProjectUndiscoverable)
}

/// Shared by the resolver and the onboarder — both need the raw
/// `loadCodeAssist` response (§4.4, §4.5).
pub(crate) async fn load_code_assist(
    client: &reqwest::Client,
    access_token: &str,
) -> Result<Value, CredentialError> {
    let resp = client
        .post(LOAD_CODE_ASSIST_URL)
        .bearer_auth(access_token)
        .json(&json!({"metadata": client_metadata()}))
        .send()
        .await
        .map_err(|e| CredentialError::AuthFailed(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(CredentialError::AuthFailed(format!(
            "loadCodeAssist returned {}",
            resp.status()
        )));
    }

    resp.json()
        .await
        .map_err(|e| CredentialError::AuthFailed(e.to_string()))
}

pub(crate) fn client_metadata() -> Value {
    json!({
        "ideType": "IDE_UNSPECIFIED",
        "platform": "PLATFORM_UNSPECIFIED",
        "pluginType": "GEMINI",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn env_override_short_circuits_everything_else() {
        let resolver = ProjectResolver::new(Some("from-env".to_string()));
        let client = reqwest::Client::new();
        let store = CredentialStore::new(std::path::PathBuf::from("/nonexistent"));
        let resolved = resolver.resolve(&client, &store).await.unwrap();
        assert_eq!(resolved, "from-env");
    }

    #[tokio::test]
    async fn cached_value_short_circuits_credential_lookup() {
        let resolver = ProjectResolver::new(None);
        *resolver.cached.write().await = Some("cached-project".to_string());
        let client = reqwest::Client::new();
        let store = CredentialStore::new(std::path::PathBuf::from("/nonexistent"));
        let resolved = resolver.resolve(&client, &store).await.unwrap();
        assert_eq!(resolved, "cached-project");
    }
}
