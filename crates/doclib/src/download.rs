use std::path::{Path, PathBuf};

use crate::record::{Credential, DocumentRecord};
use crate::remote::Remote;

/// Why a single file could not be downloaded. The batch continues past these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("invalid file name {0:?}")]
    InvalidFileName(String),
}

/// The destination directory could not be prepared. Aborts the run.
#[derive(Debug, thiserror::Error)]
#[error("cannot prepare destination {}: {source}", .path.display())]
pub struct DestinationError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Outcome of one attempted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    Skipped { reason: String },
    Downloaded { bytes: u64 },
    Failed { error: DownloadError },
}

/// A record's outcome alongside where it was (or would have been) written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub file_name: String,
    pub path: PathBuf,
    pub result: DownloadResult,
}

/// Per-file outcomes of a download run, in input order.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<FileOutcome>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> usize {
        self.count(|r| matches!(r, DownloadResult::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, DownloadResult::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, DownloadResult::Failed { .. }))
    }

    pub fn bytes_written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.result {
                DownloadResult::Downloaded { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// File names and errors of every failed record.
    pub fn failures(&self) -> Vec<(&str, &DownloadError)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                DownloadResult::Failed { error } => Some((o.file_name.as_str(), error)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&DownloadResult) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.result)).count()
    }
}

const ALREADY_EXISTS: &str = "already exists";

/// Downloads records one at a time into a destination directory.
pub struct Downloader<'a> {
    remote: &'a dyn Remote,
    destination: PathBuf,
    overwrite: bool,
}

impl<'a> Downloader<'a> {
    pub fn new(remote: &'a dyn Remote, destination: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            destination: destination.into(),
            overwrite: false,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Download every record in order.
    ///
    /// Existing files are skipped without a network call unless overwrite is
    /// set. A failed record is recorded and the loop moves on. Only an
    /// unusable destination directory aborts the run, before any fetch.
    pub async fn run(
        &self,
        records: &[DocumentRecord],
        credential: &Credential,
    ) -> Result<DownloadReport, DestinationError> {
        std::fs::create_dir_all(&self.destination).map_err(|source| DestinationError {
            path: self.destination.clone(),
            source,
        })?;
        self.check_writable()?;

        let mut report = DownloadReport::default();

        for record in records {
            let outcome = self.download_one(record, credential).await;
            match &outcome.result {
                DownloadResult::Skipped { reason } => {
                    tracing::debug!(file = %outcome.file_name, reason = %reason, "skipped");
                }
                DownloadResult::Downloaded { bytes } => {
                    tracing::info!(file = %outcome.file_name, bytes, "downloaded");
                }
                DownloadResult::Failed { error } => {
                    tracing::warn!(file = %outcome.file_name, %error, "download failed");
                }
            }
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    /// Create and drop a hidden scratch file, so a directory that exists but
    /// refuses writes fails here rather than once per record.
    fn check_writable(&self) -> Result<(), DestinationError> {
        tempfile::Builder::new()
            .prefix(".doclib-")
            .tempfile_in(&self.destination)
            .map(drop)
            .map_err(|source| DestinationError {
                path: self.destination.clone(),
                source,
            })
    }

    async fn download_one(&self, record: &DocumentRecord, credential: &Credential) -> FileOutcome {
        let outcome = |path: PathBuf, result| FileOutcome {
            file_name: record.file_name.clone(),
            path,
            result,
        };

        if !is_safe_file_name(&record.file_name) {
            return outcome(
                self.destination.clone(),
                DownloadResult::Failed {
                    error: DownloadError::InvalidFileName(record.file_name.clone()),
                },
            );
        }

        let path = self.destination.join(&record.file_name);

        if !self.overwrite && path.exists() {
            return outcome(
                path,
                DownloadResult::Skipped {
                    reason: ALREADY_EXISTS.into(),
                },
            );
        }

        let bytes = match self.remote.fetch_file(&record.source_url, credential).await {
            Ok(bytes) => bytes,
            Err(error) => return outcome(path, DownloadResult::Failed { error }),
        };

        let result = match write_atomically(&path, &bytes) {
            Ok(()) => DownloadResult::Downloaded {
                bytes: bytes.len() as u64,
            },
            Err(e) => DownloadResult::Failed {
                error: DownloadError::Write(e.to_string()),
            },
        };

        outcome(path, result)
    }
}

/// Write to a hidden sibling temp file, then rename over the target, so an
/// interrupted write never leaves a file under the final name.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let temp = part_path(path);

    if let Err(e) = std::fs::write(&temp, bytes) {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }

    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.part"))
}

/// A file name must stay inside the destination directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
