use media_sync_models::{AcquisitionRecord, LibraryItem};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryResolution {
    Matched(String),
    NoMatch,
}

/// Media server library snapshot keyed by exact (title, year).
/// When two items share a key the first one in the snapshot wins.
pub struct LibraryIndex {
    by_title_year: HashMap<(String, u32), String>,
    size: usize,
}

impl LibraryIndex {
    pub fn new(items: &[LibraryItem]) -> Self {
        let mut by_title_year = HashMap::with_capacity(items.len());
        for item in items {
            // Items without a year cannot be matched
            if let Some(year) = item.production_year {
                by_title_year.entry((item.name.clone(), year)).or_insert_with(|| item.id.clone());
            }
        }
        Self {
            by_title_year,
            size: items.len(),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn resolve(&self, title: &str, year: u32) -> LibraryResolution {
        match self.by_title_year.get(&(title.to_string(), year)) {
            Some(id) => LibraryResolution::Matched(id.clone()),
            None => LibraryResolution::NoMatch,
        }
    }

    /// Items in the snapshot, matchable or not
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Library ids of the given records, unique, in first-seen order.
/// Returns the ids and the number of records that had no match.
pub fn resolve_library_ids(index: &LibraryIndex, records: &[AcquisitionRecord]) -> (Vec<String>, usize) {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    let mut unmatched = 0;

    for record in records {
        match index.resolve(&record.title, record.year) {
            LibraryResolution::Matched(id) => {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            LibraryResolution::NoMatch => {
                debug!(title = %record.title, year = record.year, "Not in library yet");
                unmatched += 1;
            }
        }
    }
    (ids, unmatched)
}
