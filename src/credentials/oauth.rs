//! Google OAuth glue: the interactive authorization-code+PKCE flow used by
//! `auth add`, and the refresh-token exchange used on every cache miss
//! (§4.2). Client id/secret are the canonical Gemini CLI OAuth client — not
//! overridable via configuration, matching what the upstream actually
//! authorizes.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, ExtraTokenFields, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, RefreshToken, Scope, StandardRevocableToken, StandardTokenResponse, TokenUrl,
    TokenResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::OauthError;

use super::record::CredentialRecord;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const LOAD_CODE_ASSIST_URL: &str =
    "https://cloudcode-pa.googleapis.com/v1internal:loadCodeAssist";
pub const ONBOARD_CODE_ASSIST_URL: &str =
    "https://cloudcode-pa.googleapis.com/v1internal:onboardUser";

/// Fixed Gemini CLI OAuth client credentials. These identify the gateway to
/// Google as the official Gemini CLI, which is what lets the brokered
/// requests land on the Code Assist backend at all.
const CLIENT_ID: &str = "681255809395-oo8ft2oprdrnp9e3aqf6av3hmdib135j.apps.googleusercontent.com";
const CLIENT_SECRET: &str = "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";

fn scopes() -> Vec<Scope> {
    super::record::default_scopes()
        .into_iter()
        .map(Scope::new)
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct GoogleTokenField {
    pub id_token: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
impl ExtraTokenFields for GoogleTokenField {}

pub(crate) type GoogleTokenResponse = StandardTokenResponse<GoogleTokenField, BasicTokenType>;

type GoogleOauth2Client<
    HasAuthUrl = EndpointSet,
    HasDeviceAuthUrl = EndpointNotSet,
    HasIntrospectionUrl = EndpointNotSet,
    HasRevocationUrl = EndpointNotSet,
    HasTokenUrl = EndpointSet,
> = OAuth2Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    HasAuthUrl,
    HasDeviceAuthUrl,
    HasIntrospectionUrl,
    HasRevocationUrl,
    HasTokenUrl,
>;

fn redirect_url(port: u16) -> RedirectUrl {
    RedirectUrl::new(format!("http://localhost:{port}/oauth2callback"))
        .expect("valid OAuth callback URL bound to localhost")
}

fn client(port: u16) -> GoogleOauth2Client {
    OAuth2Client::new(ClientId::new(CLIENT_ID.to_string()))
        .set_client_secret(ClientSecret::new(CLIENT_SECRET.to_string()))
        .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string()).expect("valid auth url"))
        .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URI.to_string()).expect("valid token url"))
        .set_redirect_uri(redirect_url(port))
}

static HTTP_CLIENT: LazyLock<reqwest::Client> =
    LazyLock::new(|| reqwest::Client::builder().build().expect("reqwest client"));

/// One full interactive `auth add` round: build the authorize URL, wait for
/// the single-shot local callback, exchange the code, then normalize the
/// result into a [`CredentialRecord`] (§4.2).
pub struct OauthManager {
    port: u16,
}

impl OauthManager {
    pub fn new(port: u16) -> Self {
        OauthManager { port }
    }

    /// Builds the URL the user is sent to, plus the PKCE verifier and CSRF
    /// token the caller must hold onto until the callback arrives.
    pub fn authorize_url(&self) -> (url::Url, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let oauth_client = client(self.port);
        let mut req = oauth_client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");
        for scope in scopes() {
            req = req.add_scope(scope);
        }
        let (url, csrf) = req.url();
        (url, csrf, pkce_verifier)
    }

    pub async fn exchange_code(
        &self,
        code: String,
        verifier: PkceCodeVerifier,
    ) -> Result<CredentialRecord, OauthError> {
        let token: GoogleTokenResponse = client(self.port)
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(verifier)
            .request_async(&*HTTP_CLIENT)
            .await?;
        info!("OAuth2 authorization code exchange completed");
        Ok(token_response_to_record(&token))
    }

    /// Refreshes an access token from a stored refresh token (§4.2, the hot
    /// path exercised on every cache miss).
    pub async fn refresh(refresh_token: &str) -> Result<CredentialRecord, OauthError> {
        let token: GoogleTokenResponse = client(0)
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&*HTTP_CLIENT)
            .await?;
        let mut record = token_response_to_record(&token);
        if record.refresh_token.is_empty() {
            record.refresh_token = refresh_token.to_string();
        }
        Ok(record)
    }
}

fn token_response_to_record(token: &GoogleTokenResponse) -> CredentialRecord {
    let expiry = token
        .expires_in()
        .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64));
    let email = token
        .extra_fields()
        .id_token
        .as_deref()
        .and_then(crate::utils::decode_jwt_claims)
        .and_then(|claims| claims.get("email").and_then(Value::as_str).map(str::to_string));
    CredentialRecord {
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        access_token: Some(token.access_token().secret().clone()),
        refresh_token: token
            .refresh_token()
            .map(|t| t.secret().clone())
            .unwrap_or_default(),
        scopes: token
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
            .unwrap_or_else(super::record::default_scopes),
        token_uri: GOOGLE_TOKEN_URI.to_string(),
        expiry,
        project_id: None,
        email,
        created_at: Utc::now(),
    }
}

/// Retry policy shared by `loadCodeAssist`/`onboardUser` calls (§4.5); kept
/// short since the caller layers its own long-poll loop on top.
pub(crate) static OAUTH_RETRY_POLICY: LazyLock<backon::ExponentialBuilder> = LazyLock::new(|| {
    backon::ExponentialBuilder::default()
        .with_min_delay(StdDuration::from_secs(1))
        .with_max_delay(StdDuration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
});
