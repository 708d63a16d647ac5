use crate::record::DocumentRecord;

/// Category and extension predicates applied to a listing.
///
/// `None` accepts any value. Category matches exactly; extension matches
/// case-insensitively, with or without a leading dot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub category: Option<String>,
    pub extension: Option<String>,
}

impl RecordFilter {
    pub fn new(category: Option<String>, extension: Option<String>) -> Self {
        Self {
            category,
            extension: extension.map(|e| e.trim_start_matches('.').to_lowercase()),
        }
    }

    pub fn matches(&self, record: &DocumentRecord) -> bool {
        if let Some(category) = &self.category
            && &record.category != category
        {
            return false;
        }

        if let Some(wanted) = &self.extension {
            let wanted = wanted.trim_start_matches('.').to_lowercase();
            return record.file_extension().is_some_and(|ext| ext == wanted);
        }

        true
    }
}

/// Keep the records matching `predicate`, in their original order.
pub fn filter(records: &[DocumentRecord], predicate: &RecordFilter) -> Vec<DocumentRecord> {
    records
        .iter()
        .filter(|record| predicate.matches(record))
        .cloned()
        .collect()
}

/// Truncate a batch to at most `max` records when a limit is configured.
pub fn take_limit(mut records: Vec<DocumentRecord>, max: Option<usize>) -> Vec<DocumentRecord> {
    if let Some(max) = max {
        records.truncate(max);
    }
    records
}
