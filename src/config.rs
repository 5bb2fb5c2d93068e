use secrecy::SecretString;
use std::path::PathBuf;

use crate::cli::Cli;

pub const TOKEN_ENV_VAR: &str = "GOOGLE_TOKEN";
pub const DEFAULT_QUERY: &str = "is:unread older_than:1d";
pub const DEFAULT_CLIENT_SECRET_PATH: &str = "credentials.json";
pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const MAX_PAGE_SIZE: u32 = 500;
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Settings of the archive loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PurgeOptions {
    pub query: String,
    pub page_size: u32,
    pub dry_run: bool,
    pub show_headers: bool,
}

impl Default for PurgeOptions {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            dry_run: false,
            show_headers: false,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub purge: PurgeOptions,
    pub client_secret_path: PathBuf,
    pub env_token: Option<SecretString>,
    pub export_token: bool,
}

impl Config {
    /// Builds the configuration from the command line and the process environment.
    pub fn load(cli: Cli) -> Self {
        let env_token = std::env::var(TOKEN_ENV_VAR).ok();
        Self::from_parts(cli, env_token)
    }

    pub fn from_parts(cli: Cli, env_token: Option<String>) -> Self {
        // An empty variable counts as unset
        let env_token = env_token
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        Self {
            purge: PurgeOptions {
                query: cli.query,
                page_size: cli.page_size.min(MAX_PAGE_SIZE),
                dry_run: cli.dry_run,
                show_headers: cli.show_headers,
            },
            client_secret_path: cli.client_secret,
            env_token,
            export_token: cli.export_token,
        }
    }
}
