use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use yup_oauth2::authorized_user::AuthorizedUserSecret;
use yup_oauth2::storage::{TokenInfo, TokenStorage};
use yup_oauth2::{
    AccessToken, ApplicationSecret, AuthorizedUserAuthenticator, InstalledFlowAuthenticator,
    InstalledFlowReturnMethod,
};

use crate::config::{GMAIL_MODIFY_SCOPE, TOKEN_ENV_VAR};
use crate::error::{Error, Result};
use crate::types::StoredToken;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Stored access tokens this close to expiry are refreshed instead of used.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Bearer credential held for the duration of a run. Never written to disk.
#[derive(Debug)]
pub struct Credential {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
}

impl Credential {
    pub fn new(access_token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: SecretString::from(access_token),
            refresh_token: None,
            expires_at,
            client_id: None,
            client_secret: None,
        }
    }

    fn from_access_token(token: &AccessToken) -> Result<Self> {
        let access_token = token
            .token()
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingAccessTokenError)?;
        let expires_at = token.expiration_time().and_then(to_chrono);
        Ok(Self::new(access_token.to_string(), expires_at))
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token.map(SecretString::from);
        self
    }

    pub fn with_client(mut self, client_id: String, client_secret: String) -> Self {
        self.client_id = Some(client_id);
        self.client_secret = Some(SecretString::from(client_secret));
        self
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Serializes the credential in the format accepted from `GOOGLE_TOKEN`.
    pub fn export_json(&self) -> Result<String> {
        let stored = StoredToken {
            token: Some(self.access_token().to_string()),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            token_uri: Some(GOOGLE_TOKEN_URI.to_string()),
            client_id: self.client_id.clone(),
            client_secret: self
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().to_string()),
            scopes: vec![GMAIL_MODIFY_SCOPE.to_string()],
            expiry: self.expires_at,
        };
        serde_json::to_string(&stored).map_err(Error::ExportCredentialError)
    }
}

fn to_chrono(time: time::OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.unix_timestamp(), time.nanosecond())
}

// Define a trait for OAuth flow operations to allow mocking
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Runs the browser consent flow for an installed application.
    async fn interactive(&self, secret: ApplicationSecret, scopes: Vec<String>)
        -> Result<Credential>;

    /// Exchanges a refresh token for a new access token.
    async fn refresh(&self, secret: AuthorizedUserSecret, scopes: Vec<String>)
        -> Result<Credential>;
}

/// Token storage living only as long as one authenticator.
///
/// Captures the token info yup-oauth2 obtains so the refresh token can be
/// exported, without touching the filesystem.
#[derive(Clone, Default)]
struct MemoryTokenStorage {
    token: Arc<Mutex<Option<TokenInfo>>>,
}

impl MemoryTokenStorage {
    fn refresh_token(&self) -> Option<String> {
        self.token
            .lock()
            .ok()?
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn set(&self, _scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token storage lock poisoned"))?;
        *slot = Some(token);
        Ok(())
    }

    async fn get(&self, _scopes: &[&str]) -> Option<TokenInfo> {
        self.token.lock().ok()?.clone()
    }
}

// Implement the trait with yup-oauth2 authenticators
pub struct RealOAuthFlow;

#[async_trait]
impl OAuthFlow for RealOAuthFlow {
    async fn interactive(
        &self,
        secret: ApplicationSecret,
        scopes: Vec<String>,
    ) -> Result<Credential> {
        let storage = MemoryTokenStorage::default();
        let auth =
            InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
                .with_storage(Box::new(storage.clone()))
                .build()
                .await
                .map_err(Error::BuildAuthenticatorError)?;
        let scopes_refs: Vec<&str> = scopes.iter().map(|s| s.as_str()).collect();
        let token = auth
            .token(&scopes_refs)
            .await
            .map_err(Error::ObtainTokenError)?;

        Ok(Credential::from_access_token(&token)?.with_refresh_token(storage.refresh_token()))
    }

    async fn refresh(
        &self,
        secret: AuthorizedUserSecret,
        scopes: Vec<String>,
    ) -> Result<Credential> {
        let auth = AuthorizedUserAuthenticator::builder(secret)
            .build()
            .await
            .map_err(Error::BuildAuthenticatorError)?;
        let scopes_refs: Vec<&str> = scopes.iter().map(|s| s.as_str()).collect();
        let token = auth
            .token(&scopes_refs)
            .await
            .map_err(Error::ObtainTokenError)?;

        Credential::from_access_token(&token)
    }
}

// Helper function to load the client secret
async fn load_client_secret(path: &Path) -> Result<ApplicationSecret> {
    yup_oauth2::read_application_secret(path)
        .await
        .map_err(|e| Error::ReadClientSecretError(path.to_path_buf(), e))
}

fn authorized_user_secret(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<AuthorizedUserSecret> {
    serde_json::from_value(serde_json::json!({
        "client_id": client_id,
        "client_secret": client_secret,
        "refresh_token": refresh_token,
        "type": "authorized_user",
    }))
    .map_err(Error::BuildAuthorizedUserSecretError)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn credential_from_stored<O: OAuthFlow>(
    stored: StoredToken,
    client_secret_path: &Path,
    oauth_flow_impl: &O,
) -> Result<Credential> {
    let StoredToken {
        token,
        refresh_token,
        client_id,
        client_secret,
        expiry,
        ..
    } = stored;
    let refresh_token = non_empty(refresh_token);
    let client = non_empty(client_id).zip(non_empty(client_secret));

    if let Some(access_token) = non_empty(token) {
        let fresh = match expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now(),
            None => true,
        };
        if fresh {
            debug!("stored access token is still valid");
            let credential = Credential::new(access_token, expiry).with_refresh_token(refresh_token);
            return Ok(match client {
                Some((id, secret)) => credential.with_client(id, secret),
                None => credential,
            });
        }
        debug!("stored access token expired at {:?}", expiry);
    }

    let refresh_token = refresh_token.ok_or(Error::MissingRefreshCredentialsError)?;

    // Go-style tokens carry no client, so take it from the client secret file
    let (client_id, client_secret) = match client {
        Some(client) => client,
        None => {
            let secret = load_client_secret(client_secret_path).await?;
            (secret.client_id, secret.client_secret)
        }
    };

    info!("Refreshing access token");
    let secret = authorized_user_secret(&client_id, &client_secret, &refresh_token)?;
    let credential = oauth_flow_impl
        .refresh(secret, vec![GMAIL_MODIFY_SCOPE.to_string()])
        .await?;

    Ok(credential
        .with_refresh_token(Some(refresh_token))
        .with_client(client_id, client_secret))
}

/// Produces a credential for the gmail.modify scope.
///
/// A non-empty `GOOGLE_TOKEN` blob is parsed in memory and used (refreshing it
/// if needed); the interactive flow only runs when no blob is given.
pub async fn acquire_credential<O: OAuthFlow>(
    env_token: Option<&SecretString>,
    client_secret_path: &Path,
    oauth_flow_impl: &O,
) -> Result<Credential> {
    match env_token {
        Some(blob) => {
            info!("Using credential from {}", TOKEN_ENV_VAR);
            let stored: StoredToken = serde_json::from_str(blob.expose_secret())
                .map_err(Error::ParseStoredTokenError)?;
            credential_from_stored(stored, client_secret_path, oauth_flow_impl).await
        }
        None => {
            info!(
                "{} is not set, starting interactive authorization with {}",
                TOKEN_ENV_VAR,
                client_secret_path.display()
            );
            let secret = load_client_secret(client_secret_path).await?;
            let client_id = secret.client_id.clone();
            let client_secret = secret.client_secret.clone();
            let credential = oauth_flow_impl
                .interactive(secret, vec![GMAIL_MODIFY_SCOPE.to_string()])
                .await?;
            Ok(credential.with_client(client_id, client_secret))
        }
    }
}
