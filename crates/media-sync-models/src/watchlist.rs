use serde::{Deserialize, Serialize};

/// One film found on a watchlist page.
///
/// `tmdb_id` is the identifier shared with the acquisition service and is the
/// value stored as the incremental cursor. `slug` is the film page it was read
/// from and is only kept for logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub tmdb_id: String,
    pub slug: String,
}

impl WatchlistEntry {
    pub fn new(tmdb_id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            tmdb_id: tmdb_id.into(),
            slug: slug.into(),
        }
    }
}

/// Why a scrape stopped paginating
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// A page held fewer posters than a full page
    ShortPage,
    /// The incremental cursor was met
    CursorReached,
    /// A page could not be fetched after all retries
    FetchFailed { page: u32 },
}

/// Result of one watchlist scrape, entries newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapeOutcome {
    pub entries: Vec<WatchlistEntry>,
    pub stop_reason: StopReason,
    pub pages_scanned: u32,
}

impl ScrapeOutcome {
    /// Pagination ended on a natural stop condition
    pub fn completed(&self) -> bool {
        !matches!(self.stop_reason, StopReason::FetchFailed { .. })
    }

    /// Cursor to store after this scrape. `None` means the stored cursor must
    /// stay as it is: nothing was found, or the walk was cut short and entries
    /// between the old cursor and the failure point were never seen.
    pub fn new_cursor(&self) -> Option<&str> {
        if !self.completed() {
            return None;
        }
        self.entries.first().map(|e| e.tmdb_id.as_str())
    }

    pub fn tmdb_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.tmdb_id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
