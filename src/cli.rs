use clap::Parser;
use std::path::PathBuf;

use crate::config::{DEFAULT_CLIENT_SECRET_PATH, DEFAULT_PAGE_SIZE, DEFAULT_QUERY, MAX_PAGE_SIZE};

/// Archive unread Gmail messages older than a day.
///
/// Credentials are read from the GOOGLE_TOKEN environment variable. When it is
/// unset or empty, an interactive browser consent flow is started using the
/// client secret file.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Gmail search query selecting the messages to archive.
    #[clap(long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Number of messages requested per page.
    #[clap(long, default_value_t = DEFAULT_PAGE_SIZE,
           value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64))]
    pub page_size: u32,

    /// List matching messages without modifying them.
    #[clap(long)]
    pub dry_run: bool,

    /// Log the Subject and Date of every matching message.
    #[clap(long)]
    pub show_headers: bool,

    /// OAuth client secret used by the interactive consent flow.
    #[clap(long, default_value = DEFAULT_CLIENT_SECRET_PATH)]
    pub client_secret: PathBuf,

    /// Print the acquired credential as a GOOGLE_TOKEN value and exit.
    #[clap(long)]
    pub export_token: bool,
}
