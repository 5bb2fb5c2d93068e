use tracing::{debug, info, warn};

use crate::config::PurgeOptions;
use crate::error::Result;
use crate::gmail_api::MailboxApi;
use crate::types::BatchModifyRequest;

const HEADERS_TO_SHOW: [&str; 2] = ["Subject", "Date"];

/// Counters for one archive run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeSummary {
    pub pages: usize,
    pub listed: usize,
    pub archived: usize,
    pub modify_calls: usize,
}

/// Archives every message matching the configured query, one page at a time.
///
/// Each non-empty page gets exactly one batch-modify call with that page's
/// ids. The loop stops after the first page without a continuation token.
/// An error aborts the run; pages already modified stay modified.
pub async fn archive_all<A>(api: &A, options: &PurgeOptions) -> Result<PurgeSummary>
where
    A: MailboxApi + ?Sized,
{
    let mut summary = PurgeSummary::default();
    let mut page_token: Option<String> = None;

    info!("Getting messages matching '{}'...", options.query);

    loop {
        let page = api
            .list_messages(&options.query, options.page_size, page_token.as_deref())
            .await?;
        summary.pages += 1;
        summary.listed += page.ids.len();
        debug!(
            "page {} has {} messages, next page: {}",
            summary.pages,
            page.ids.len(),
            page.next_page_token.is_some()
        );

        if options.show_headers {
            show_headers(api, &page.ids).await;
        }

        if page.ids.is_empty() {
            debug!("page {} is empty, nothing to archive", summary.pages);
        } else if options.dry_run {
            info!("Dry run: would archive {} messages", page.ids.len());
        } else {
            let count = page.ids.len();
            info!("Archiving {} messages", count);
            api.batch_modify(&BatchModifyRequest::archive(page.ids))
                .await?;
            summary.modify_calls += 1;
            summary.archived += count;
        }

        match page.next_page_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    info!(
        "Done: {} pages, {} messages listed, {} archived",
        summary.pages, summary.listed, summary.archived
    );
    Ok(summary)
}

// Header lookups are informational only, failures are logged and skipped
async fn show_headers<A>(api: &A, ids: &[String])
where
    A: MailboxApi + ?Sized,
{
    for id in ids {
        match api.message_metadata(id, &HEADERS_TO_SHOW).await {
            Ok(message) => {
                let values: Vec<&str> = HEADERS_TO_SHOW
                    .iter()
                    .filter_map(|name| message.header(name))
                    .collect();
                info!("{}: {}", id, values.join(" "));
            }
            Err(e) => warn!("cannot fetch headers of {}: {}", id, e),
        }
    }
}
