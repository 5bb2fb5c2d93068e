use clap::Parser;
use gmail_purge::app::run;
use gmail_purge::cli::Cli;
use gmail_purge::config::Config;
use gmail_purge::logging;
use tracing::error;

// One thread of control: every request is awaited before the next one starts
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli);

    let dispatch = logging::stdout_dispatcher();
    let _log_guard = tracing::dispatcher::set_default(&dispatch);

    if let Err(e) = run(config).await {
        error!("Purge failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
