use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Credential refreshes are triggered this far ahead of the recorded expiry
/// (§3, §8: "refreshed eagerly when skew >= 5s").
const EXPIRY_SKEW: Duration = Duration::seconds(5);

/// On-disk/env representation of the single active credential (§3).
///
/// `refresh_token` is the only field whose absence makes the record unusable;
/// everything else may be filled in lazily (by refresh, by project discovery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub client_id: String,
    pub client_secret: String,

    #[serde(default, alias = "token")]
    pub access_token: Option<String>,

    pub refresh_token: String,

    #[serde(default, deserialize_with = "deserialize_scopes", alias = "scope")]
    pub scopes: Vec<String>,

    pub token_uri: String,

    #[serde(
        default,
        serialize_with = "serialize_expiry",
        deserialize_with = "deserialize_expiry"
    )]
    pub expiry: Option<DateTime<Utc>>,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// A best-effort record synthesized when full parsing fails but a
    /// `refresh_token` was recoverable from the payload (§4.3 "minimal
    /// record").
    pub fn minimal(refresh_token: String, client_id: String, client_secret: String) -> Self {
        CredentialRecord {
            client_id,
            client_secret,
            access_token: None,
            refresh_token,
            scopes: default_scopes(),
            token_uri: super::oauth::GOOGLE_TOKEN_URI.to_string(),
            expiry: None,
            project_id: None,
            email: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() + EXPIRY_SKEW >= expiry,
            None => true,
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }
}

pub fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/cloud-platform".to_string(),
        "https://www.googleapis.com/auth/userinfo.email".to_string(),
        "https://www.googleapis.com/auth/userinfo.profile".to_string(),
    ]
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        SpaceDelimited(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(default_scopes()),
        Some(Raw::List(list)) => Ok(list),
        Some(Raw::SpaceDelimited(s)) => Ok(s.split_whitespace().map(str::to_string).collect()),
    }
}

/// Accepts `...+00:00`, `...Z`, or naive ISO timestamps (interpreted as UTC).
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw else { return Ok(None) };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(naive.and_utc()));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Some(naive.and_utc()));
    }

    Err(serde::de::Error::custom(format!(
        "unrecognized expiry timestamp: {raw}"
    )))
}

/// Canonicalizes to `YYYY-MM-DDTHH:MM:SSZ` on save (§4.3).
fn serialize_expiry<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        None => serializer.serialize_none(),
    }
}

/// `{Unloaded, Loaded{valid}, Loaded{expired}}` view of a credential used for
/// logging state transitions (§4.2) without requiring callers to inspect
/// `expiry` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Unloaded,
    Valid,
    Expired,
}

impl CredentialRecord {
    pub fn state(&self) -> CredentialState {
        if !self.is_usable() {
            CredentialState::Unloaded
        } else if self.access_token.is_none() || self.is_expired() {
            CredentialState::Expired
        } else {
            CredentialState::Valid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CredentialRecord {
        CredentialRecord {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            access_token: Some("tok".to_string()),
            refresh_token: "refresh".to_string(),
            scopes: default_scopes(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            expiry: Some(Utc::now() + Duration::hours(1)),
            project_id: Some("proj-1".to_string()),
            email: Some("a@example.com".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn normalize_save_load_normalize_is_idempotent() {
        let original = sample();
        let saved = serde_json::to_value(&original).unwrap();
        let reloaded: CredentialRecord = serde_json::from_value(saved.clone()).unwrap();
        let resaved = serde_json::to_value(&reloaded).unwrap();
        assert_eq!(saved, resaved);
    }

    #[test]
    fn access_token_alias_token_accepted() {
        let record: CredentialRecord = serde_json::from_value(json!({
            "client_id": "id",
            "client_secret": "secret",
            "token": "tok",
            "refresh_token": "refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
        }))
        .unwrap();
        assert_eq!(record.access_token.as_deref(), Some("tok"));
    }

    #[test]
    fn space_delimited_scope_alias_accepted() {
        let record: CredentialRecord = serde_json::from_value(json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
            "scope": "a b c",
        }))
        .unwrap();
        assert_eq!(record.scopes, vec!["a", "b", "c"]);
    }

    #[test]
    fn expiry_accepts_z_and_offset_and_naive_forms() {
        for raw in [
            "2999-01-01T00:00:00Z",
            "2999-01-01T00:00:00+00:00",
            "2999-01-01T00:00:00",
        ] {
            let record: CredentialRecord = serde_json::from_value(json!({
                "client_id": "id",
                "client_secret": "secret",
                "refresh_token": "refresh",
                "token_uri": "https://oauth2.googleapis.com/token",
                "expiry": raw,
            }))
            .unwrap();
            assert!(record.expiry.is_some(), "failed to parse {raw}");
        }
    }

    #[test]
    fn expiry_skew_refreshes_eagerly_at_boundary() {
        let mut record = sample();
        record.expiry = Some(Utc::now() + Duration::seconds(5));
        assert!(record.is_expired());

        record.expiry = Some(Utc::now() + Duration::seconds(120));
        assert!(!record.is_expired());
    }

    #[test]
    fn missing_refresh_token_is_unusable() {
        let record = CredentialRecord {
            refresh_token: String::new(),
            ..sample()
        };
        assert!(!record.is_usable());
        assert_eq!(record.state(), CredentialState::Unloaded);
    }
}
