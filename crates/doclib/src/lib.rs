pub mod download;
pub mod feedback;
pub mod filter;
pub mod listing;
pub mod record;
pub mod remote;
pub mod secret;

pub use download::{
    DestinationError, DownloadError, DownloadReport, DownloadResult, Downloader, FileOutcome,
};
pub use feedback::Feedback;
pub use filter::{RecordFilter, filter, take_limit};
pub use listing::{
    EntryProblem, Listing, ListingSchema, MalformedEntry, RetrievalError, extract, fetch_listing,
};
pub use record::{Credential, DocumentRecord, Secret, SourceUrl, UrlError};
pub use remote::Remote;
pub use secret::{CredentialRef, SecretError, SecretProvider, SecretRef};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
