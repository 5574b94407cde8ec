use async_trait::async_trait;
use media_sync_models::{
    AcquisitionOutcome, AcquisitionRecord, AcquisitionRequest, CollectionItem, LibraryItem, MediaServerUser,
    MovieCategory, ScrapeMode, ScrapeOutcome, StopReason, WatchlistEntry,
};
use media_sync_sources::{AcquisitionService, MediaServer, SourceError, WatchlistSource};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn transport_error(url: &str) -> SourceError {
    SourceError::Transport {
        url: url.to_string(),
        message: "connection reset".to_string(),
    }
}

pub fn record(tmdb_id: u32, title: &str, year: u32) -> AcquisitionRecord {
    AcquisitionRecord {
        title: title.to_string(),
        year,
        monitored: false,
        has_file: false,
        category: MovieCategory::General,
        tmdb_id,
    }
}

pub fn outcome(ids: &[&str], stop_reason: StopReason) -> ScrapeOutcome {
    ScrapeOutcome {
        entries: ids.iter().map(|id| WatchlistEntry::new(*id, format!("film/{}/", id))).collect(),
        stop_reason,
        pages_scanned: 1,
    }
}

/// Serves canned scrape outcomes per user and remembers the modes asked for
#[derive(Default)]
pub struct FakeWatchlist {
    pub outcomes: HashMap<String, ScrapeOutcome>,
    pub calls: Mutex<Vec<(String, ScrapeMode)>>,
}

impl FakeWatchlist {
    pub fn with(mut self, username: &str, outcome: ScrapeOutcome) -> Self {
        self.outcomes.insert(username.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> Vec<(String, ScrapeMode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WatchlistSource for FakeWatchlist {
    fn source_name(&self) -> &str {
        "fake"
    }

    async fn scrape_watchlist(&self, username: &str, mode: &ScrapeMode) -> ScrapeOutcome {
        self.calls.lock().unwrap().push((username.to_string(), mode.clone()));
        self.outcomes
            .get(username)
            .cloned()
            .unwrap_or_else(|| outcome(&[], StopReason::ShortPage))
    }
}

/// Acquisition service keyed by TMDB id. Ids in `existing` answer
/// `AlreadyPresent`, ids in `failing_lookups` or `failing_adds` fail.
#[derive(Default)]
pub struct FakeAcquisition {
    pub catalog: HashMap<String, Vec<AcquisitionRecord>>,
    pub existing: HashSet<u32>,
    pub failing_lookups: HashSet<String>,
    pub failing_adds: HashSet<u32>,
    pub lookups: Mutex<Vec<String>>,
    pub adds: Mutex<Vec<AcquisitionRequest>>,
}

impl FakeAcquisition {
    pub fn with(mut self, tmdb_id: &str, records: Vec<AcquisitionRecord>) -> Self {
        self.catalog.insert(tmdb_id.to_string(), records);
        self
    }

    pub fn adds(&self) -> Vec<AcquisitionRequest> {
        self.adds.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl AcquisitionService for FakeAcquisition {
    fn service_name(&self) -> &str {
        "fake"
    }

    async fn lookup_movie(&self, tmdb_id: &str) -> Result<Vec<AcquisitionRecord>, SourceError> {
        self.lookups.lock().unwrap().push(tmdb_id.to_string());
        if self.failing_lookups.contains(tmdb_id) {
            return Err(transport_error("movie/lookup"));
        }
        Ok(self.catalog.get(tmdb_id).cloned().unwrap_or_default())
    }

    async fn add_movie(&self, request: &AcquisitionRequest) -> Result<AcquisitionOutcome, SourceError> {
        self.adds.lock().unwrap().push(request.clone());
        if self.failing_adds.contains(&request.tmdb_id) {
            return Err(SourceError::UnexpectedStatus {
                url: "movie".to_string(),
                status: 500,
                expected: vec![201, 400],
            });
        }
        if self.existing.contains(&request.tmdb_id) {
            Ok(AcquisitionOutcome::AlreadyPresent)
        } else {
            Ok(AcquisitionOutcome::Added)
        }
    }
}

#[derive(Default)]
pub struct FakeMediaServer {
    pub users: Vec<MediaServerUser>,
    pub library: Vec<LibraryItem>,
    /// Collection id to members
    pub collections: HashMap<String, Vec<CollectionItem>>,
    pub failing_removals: HashSet<String>,
    /// Zero-based indexes of add calls that fail
    pub failing_add_calls: HashSet<usize>,
    pub library_calls: Mutex<usize>,
    pub removed: Mutex<Vec<(String, String)>>,
    pub added: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeMediaServer {
    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.users.push(MediaServerUser {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_movie(mut self, id: &str, name: &str, year: u32) -> Self {
        self.library.push(LibraryItem {
            id: id.to_string(),
            name: name.to_string(),
            production_year: Some(year),
        });
        self
    }

    pub fn with_member(mut self, collection_id: &str, id: &str, played: bool) -> Self {
        self.collections
            .entry(collection_id.to_string())
            .or_default()
            .push(CollectionItem {
                id: id.to_string(),
                name: format!("Movie {}", id),
                played,
            });
        self
    }

    pub fn removed(&self) -> Vec<(String, String)> {
        self.removed.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<(String, Vec<String>)> {
        self.added.lock().unwrap().clone()
    }

    pub fn library_calls(&self) -> usize {
        *self.library_calls.lock().unwrap()
    }
}

#[async_trait]
impl MediaServer for FakeMediaServer {
    fn server_name(&self) -> &str {
        "fake"
    }

    async fn users(&self) -> Result<Vec<MediaServerUser>, SourceError> {
        Ok(self.users.clone())
    }

    async fn library_movies(&self) -> Result<Vec<LibraryItem>, SourceError> {
        *self.library_calls.lock().unwrap() += 1;
        Ok(self.library.clone())
    }

    async fn collection_items(&self, _user_id: &str, collection_id: &str) -> Result<Vec<CollectionItem>, SourceError> {
        Ok(self.collections.get(collection_id).cloned().unwrap_or_default())
    }

    async fn remove_from_collection(&self, collection_id: &str, item_id: &str) -> Result<(), SourceError> {
        if self.failing_removals.contains(item_id) {
            return Err(transport_error("Collections"));
        }
        self.removed
            .lock()
            .unwrap()
            .push((collection_id.to_string(), item_id.to_string()));
        Ok(())
    }

    async fn add_to_collection(&self, collection_id: &str, item_ids: &[String]) -> Result<(), SourceError> {
        let mut added = self.added.lock().unwrap();
        let call = added.len();
        added.push((collection_id.to_string(), item_ids.to_vec()));
        if self.failing_add_calls.contains(&call) {
            return Err(transport_error("Collections"));
        }
        Ok(())
    }
}
