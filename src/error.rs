use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// The global `Result` alias of the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The global `Error` enum of the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read client secret from {0}")]
    ReadClientSecretError(PathBuf, #[source] std::io::Error),
    #[error("cannot parse GOOGLE_TOKEN credential")]
    ParseStoredTokenError(#[source] serde_json::Error),
    #[error("access token is expired and no refresh token is available")]
    MissingRefreshCredentialsError,
    #[error("cannot build authorized user secret")]
    BuildAuthorizedUserSecretError(#[source] serde_json::Error),
    #[error("cannot build oauth authenticator")]
    BuildAuthenticatorError(#[source] std::io::Error),
    #[error("cannot obtain access token")]
    ObtainTokenError(#[source] yup_oauth2::Error),
    #[error("oauth flow returned no access token")]
    MissingAccessTokenError,
    #[error("cannot build gmail client")]
    BuildGmailClientError(#[source] reqwest::Error),
    #[error("cannot export credential")]
    ExportCredentialError(#[source] serde_json::Error),
    #[error("gmail api call {operation} failed with {status}: {body}")]
    ApiError {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
}
