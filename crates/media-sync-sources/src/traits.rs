use crate::error::SourceError;
use async_trait::async_trait;
use media_sync_models::{
    AcquisitionOutcome, AcquisitionRecord, AcquisitionRequest, CollectionItem, LibraryItem, MediaServerUser,
    ScrapeMode, ScrapeOutcome,
};

/// Where watchlists come from
#[async_trait]
pub trait WatchlistSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Walk the user's watchlist newest first. Never fails as a whole: a fetch
    /// that exhausts its retries ends the walk with `StopReason::FetchFailed`
    /// and whatever was collected so far.
    async fn scrape_watchlist(&self, username: &str, mode: &ScrapeMode) -> ScrapeOutcome;
}

/// Service that downloads movies
#[async_trait]
pub trait AcquisitionService: Send + Sync {
    fn service_name(&self) -> &str;

    /// All records the service knows for a TMDB id. Empty means unknown id.
    async fn lookup_movie(&self, tmdb_id: &str) -> Result<Vec<AcquisitionRecord>, SourceError>;

    /// Add-if-absent. A movie that already exists is `AlreadyPresent`, not an error.
    async fn add_movie(&self, request: &AcquisitionRequest) -> Result<AcquisitionOutcome, SourceError>;
}

/// Media server holding the library and per-user collections
#[async_trait]
pub trait MediaServer: Send + Sync {
    fn server_name(&self) -> &str;

    async fn users(&self) -> Result<Vec<MediaServerUser>, SourceError>;

    /// Id of the user with exactly this name
    async fn find_user_id(&self, name: &str) -> Result<Option<String>, SourceError> {
        let users = self.users().await?;
        Ok(users.into_iter().find(|u| u.name == name).map(|u| u.id))
    }

    /// Every movie in the library, used to map titles to library ids
    async fn library_movies(&self) -> Result<Vec<LibraryItem>, SourceError>;

    /// Collection members with `user_id`'s watched state
    async fn collection_items(&self, user_id: &str, collection_id: &str) -> Result<Vec<CollectionItem>, SourceError>;

    async fn remove_from_collection(&self, collection_id: &str, item_id: &str) -> Result<(), SourceError>;

    async fn add_to_collection(&self, collection_id: &str, item_ids: &[String]) -> Result<(), SourceError>;
}
