pub mod download;
pub mod format;
pub mod list;

use anyhow::{Context, Result};
use doclib::{Credential, DocumentRecord, Feedback, Listing, Remote};

use crate::config::AppConfig;

/// Print feedback items to stderr.
pub fn print_feedback(feedback: &[Feedback]) {
    for item in feedback {
        eprintln!("{item}");
    }
}

/// The retrieved listing and the records selected from it.
pub struct Selection {
    pub listing: Listing,
    /// Records matching the category and extension filters.
    pub matched: usize,
    /// Matching records after the `max_files` limit.
    pub batch: Vec<DocumentRecord>,
}

/// Fetch the listing, report malformed entries, and apply filters and limit.
pub async fn select(
    remote: &dyn Remote,
    config: &AppConfig,
    credential: &Credential,
) -> Result<Selection> {
    let listing = doclib::fetch_listing(remote, &config.endpoint_url, credential, &config.schema)
        .await
        .with_context(|| format!("failed to retrieve listing from {}", config.endpoint_url))?;

    let feedback: Vec<Feedback> = listing.malformed.iter().map(Feedback::for_malformed).collect();
    print_feedback(&feedback);

    let matched = doclib::filter(&listing.records, &config.record_filter());
    let matched_count = matched.len();
    let batch = doclib::take_limit(matched, config.max_files);

    Ok(Selection {
        listing,
        matched: matched_count,
        batch,
    })
}
