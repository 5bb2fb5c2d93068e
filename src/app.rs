use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::gmail_api::{
    acquire_credential, GmailClient, OAuthFlow, RealOAuthFlow, GMAIL_API_BASE_URL,
};
use crate::purge::{archive_all, PurgeSummary};

/// Runs one purge against Gmail with the real OAuth flow.
///
/// Returns `None` when the run only exported the credential.
pub async fn run(config: Config) -> Result<Option<PurgeSummary>> {
    run_with(config, &RealOAuthFlow, GMAIL_API_BASE_URL).await
}

pub async fn run_with<O: OAuthFlow>(
    config: Config,
    oauth_flow_impl: &O,
    api_base_url: &str,
) -> Result<Option<PurgeSummary>> {
    info!("Starting purge...");

    let credential = acquire_credential(
        config.env_token.as_ref(),
        &config.client_secret_path,
        oauth_flow_impl,
    )
    .await?;

    if config.export_token {
        // The exported blob is the program output, not a log line
        println!("{}", credential.export_json()?);
        return Ok(None);
    }

    // A client that cannot be built is fatal, there is no degraded mode
    let client = GmailClient::with_base_url(&credential, api_base_url)?;

    let summary = archive_all(&client, &config.purge).await?;
    Ok(Some(summary))
}
