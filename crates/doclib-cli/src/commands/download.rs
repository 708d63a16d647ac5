use anyhow::Result;
use doclib::{Credential, DownloadReport, Downloader, Feedback, Remote};

use super::{print_feedback, select};
use crate::config::AppConfig;

/// Counts for one end-to-end run.
#[derive(Debug)]
pub struct RunSummary {
    pub listed: usize,
    pub malformed: usize,
    pub matched: usize,
    pub batch: usize,
    pub report: DownloadReport,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.report.failed()
    }
}

/// Retrieve, filter and download. Listing and destination failures abort;
/// per-file failures are left in the report.
pub async fn execute(
    remote: &dyn Remote,
    config: &AppConfig,
    listing_credential: &Credential,
    download_credential: &Credential,
) -> Result<RunSummary> {
    let selection = select(remote, config, listing_credential).await?;

    let report = Downloader::new(remote, &config.destination_dir)
        .overwrite(config.overwrite)
        .run(&selection.batch, download_credential)
        .await?;

    Ok(RunSummary {
        listed: selection.listing.entry_count(),
        malformed: selection.listing.malformed.len(),
        matched: selection.matched,
        batch: selection.batch.len(),
        report,
    })
}

/// Run the pipeline and print per-file feedback and the final summary.
pub async fn run(
    remote: &dyn Remote,
    config: &AppConfig,
    listing_credential: &Credential,
    download_credential: &Credential,
) -> Result<RunSummary> {
    println!(
        "Downloading into {}...",
        config.destination_dir.display()
    );

    let summary = execute(remote, config, listing_credential, download_credential).await?;

    let feedback: Vec<Feedback> = summary
        .report
        .outcomes
        .iter()
        .filter_map(Feedback::for_outcome)
        .filter(|fb| !fb.is_info())
        .collect();
    print_feedback(&feedback);

    for line in summary_lines(&summary) {
        println!("{line}");
    }

    Ok(summary)
}

fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let report = &summary.report;
    let mut lines = Vec::new();

    let mut listed = format!("Listed {} entries", summary.listed);
    if summary.malformed > 0 {
        listed.push_str(&format!(" ({} malformed, skipped)", summary.malformed));
    }
    lines.push(listed);

    let mut matched = format!("Matched {} documents", summary.matched);
    if summary.batch < summary.matched {
        matched.push_str(&format!(" (limited to {})", summary.batch));
    }
    lines.push(matched);

    lines.push(format!(
        "Downloaded {} ({} bytes), skipped {}, failed {}.",
        report.downloaded(),
        report.bytes_written(),
        report.skipped(),
        report.failed()
    ));

    for (file_name, error) in report.failures() {
        lines.push(format!("  failed: {file_name}: {error}"));
    }

    lines
}
