use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{Credential, DocumentRecord, SourceUrl};
use crate::remote::Remote;

/// Errors that abort listing retrieval.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    #[error("listing request returned HTTP {0}")]
    Status(u16),

    #[error("listing request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Field names read from each listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListingSchema {
    pub category: String,
    pub name: String,
    pub metadata: String,
    pub url: String,
}

impl Default for ListingSchema {
    fn default() -> Self {
        Self {
            category: "Category".into(),
            name: "Name".into(),
            metadata: "__metadata".into(),
            url: "media_src".into(),
        }
    }
}

/// Why a single listing entry could not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryProblem {
    NotAnObject,
    Missing,
    NotAString,
    InvalidUrl(String),
}

/// A listing entry that was skipped during extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("entry {index}: field {field:?} {}", describe(.problem))]
pub struct MalformedEntry {
    pub index: usize,
    pub field: String,
    pub problem: EntryProblem,
}

fn describe(problem: &EntryProblem) -> String {
    match problem {
        EntryProblem::NotAnObject => "is not an object".into(),
        EntryProblem::Missing => "is missing".into(),
        EntryProblem::NotAString => "is not a string".into(),
        EntryProblem::InvalidUrl(reason) => format!("is not a valid URL ({reason})"),
    }
}

/// Records extracted from a listing, plus the entries that were skipped.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub records: Vec<DocumentRecord>,
    pub malformed: Vec<MalformedEntry>,
}

impl Listing {
    /// Total entries seen in the listing, including malformed ones.
    pub fn entry_count(&self) -> usize {
        self.records.len() + self.malformed.len()
    }
}

/// Retrieve the listing at `endpoint` and flatten it into records.
pub async fn fetch_listing(
    remote: &dyn Remote,
    endpoint: &str,
    credential: &Credential,
    schema: &ListingSchema,
) -> Result<Listing, RetrievalError> {
    tracing::debug!(endpoint, "fetching listing");
    let body = remote.fetch_listing(endpoint, credential).await?;
    let listing = extract(&body, schema)?;

    for entry in &listing.malformed {
        tracing::warn!(%entry, "skipping malformed listing entry");
    }
    tracing::info!(
        records = listing.records.len(),
        malformed = listing.malformed.len(),
        "listing retrieved"
    );

    Ok(listing)
}

/// Locate the results sequence in a listing response and extract one record per entry.
///
/// Accepted envelopes: `{"d": {"results": [...]}}`, `{"d": [...]}`,
/// `{"results": [...]}`, `{"value": [...]}` and a bare array.
pub fn extract(body: &Value, schema: &ListingSchema) -> Result<Listing, RetrievalError> {
    let entries = results_sequence(body)
        .ok_or_else(|| RetrievalError::Parse("no results sequence in listing response".into()))?;

    let mut listing = Listing::default();

    for (index, entry) in entries.iter().enumerate() {
        match extract_entry(index, entry, schema) {
            Ok(record) => listing.records.push(record),
            Err(malformed) => listing.malformed.push(malformed),
        }
    }

    Ok(listing)
}

fn results_sequence(body: &Value) -> Option<&Vec<Value>> {
    let mut node = body;

    if let Some(inner) = node.get("d") {
        node = inner;
    } else if let Some(inner) = node.get("value") {
        return inner.as_array();
    }

    if let Some(inner) = node.get("results") {
        node = inner;
    }

    node.as_array()
}

fn extract_entry(
    index: usize,
    entry: &Value,
    schema: &ListingSchema,
) -> Result<DocumentRecord, MalformedEntry> {
    let malformed = |field: &str, problem| MalformedEntry {
        index,
        field: field.to_owned(),
        problem,
    };

    let object = entry
        .as_object()
        .ok_or_else(|| malformed("", EntryProblem::NotAnObject))?;

    let category = string_field(object, &schema.category).map_err(|p| malformed(&schema.category, p))?;
    let file_name = string_field(object, &schema.name).map_err(|p| malformed(&schema.name, p))?;

    let metadata = match object.get(&schema.metadata) {
        None | Some(Value::Null) => return Err(malformed(&schema.metadata, EntryProblem::Missing)),
        Some(value) => value
            .as_object()
            .ok_or_else(|| malformed(&schema.metadata, EntryProblem::NotAnObject))?,
    };

    let url_field = format!("{}.{}", schema.metadata, schema.url);
    let raw_url = string_field(metadata, &schema.url).map_err(|p| malformed(&url_field, p))?;
    let source_url = SourceUrl::normalize(raw_url)
        .map_err(|e| malformed(&url_field, EntryProblem::InvalidUrl(e.reason)))?;

    Ok(DocumentRecord::new(category, file_name, source_url))
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, EntryProblem> {
    match object.get(key) {
        None | Some(Value::Null) => Err(EntryProblem::Missing),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(EntryProblem::NotAString),
    }
}
