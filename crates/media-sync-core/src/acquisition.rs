//! Acquisition phase: look every watchlist id up in the acquisition service
//! and add the ones it can resolve.

use crate::progress::{ProgressCounts, ProgressTracker};
use futures::stream::{self, StreamExt};
use media_sync_config::{RadarrConfig, SyncOptions as ConfigSyncOptions};
use media_sync_models::{AcquisitionOutcome, AcquisitionRecord, AcquisitionRequest, MovieCategory};
use media_sync_sources::{AcquisitionService, SourceError};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionSettings {
    pub quality_profile_id: u32,
    pub movies_root: String,
    pub anime_movies_root: String,
    /// Lookups in flight at once
    pub concurrency: usize,
}

impl AcquisitionSettings {
    pub fn from_config(radarr: &RadarrConfig, sync: &ConfigSyncOptions) -> Self {
        Self {
            quality_profile_id: radarr.quality_profile_id,
            movies_root: radarr.root_folders.movies.clone(),
            anime_movies_root: radarr.root_folders.anime_movies.clone(),
            concurrency: sync.acquisition_concurrency,
        }
    }

    pub fn root_folder_for(&self, category: MovieCategory) -> &str {
        match category {
            MovieCategory::Animation => &self.anime_movies_root,
            MovieCategory::General => &self.movies_root,
        }
    }

    /// Monitored add with search-on-add, routed by category
    pub fn request_for(&self, record: &AcquisitionRecord) -> AcquisitionRequest {
        AcquisitionRequest {
            tmdb_id: record.tmdb_id,
            title: record.title.clone(),
            year: record.year,
            quality_profile_id: self.quality_profile_id,
            monitored: true,
            root_folder_path: self.root_folder_for(record.category).to_string(),
            search_on_add: true,
        }
    }
}

/// Result of the acquisition phase for one user
#[derive(Debug, Clone, Default, Serialize)]
pub struct AcquisitionReport {
    /// Every record the service resolved, in watchlist order. These are the
    /// candidates for the user's collection, whether or not the add succeeded.
    #[serde(skip)]
    pub records: Vec<AcquisitionRecord>,
    #[serde(flatten)]
    pub counts: ProgressCounts,
    pub not_found: usize,
}

/// Current state of one id. `None` when the service does not know it.
pub async fn resolve_acquisition_state(
    service: &dyn AcquisitionService,
    tmdb_id: &str,
) -> Result<Option<AcquisitionRecord>, SourceError> {
    let mut records = service.lookup_movie(tmdb_id).await?;
    if records.len() > 1 {
        debug!(tmdb_id, results = records.len(), "Lookup returned several movies, using the first");
    }
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(records.swap_remove(0)))
}

pub async fn ensure_acquired(
    service: &dyn AcquisitionService,
    settings: &AcquisitionSettings,
    record: &AcquisitionRecord,
) -> Result<AcquisitionOutcome, SourceError> {
    let request = settings.request_for(record);
    let outcome = service.add_movie(&request).await?;
    debug!(
        tmdb_id = record.tmdb_id,
        title = %record.title,
        root_folder = %request.root_folder_path,
        outcome = ?outcome,
        "Acquisition requested"
    );
    Ok(outcome)
}

enum ItemResult {
    Acquired(AcquisitionRecord, AcquisitionOutcome),
    AddFailed(AcquisitionRecord, SourceError),
    NotFound,
    LookupFailed(SourceError),
    Blank,
}

async fn acquire_one(service: &dyn AcquisitionService, settings: &AcquisitionSettings, tmdb_id: &str) -> ItemResult {
    if tmdb_id.is_empty() {
        return ItemResult::Blank;
    }
    let record = match resolve_acquisition_state(service, tmdb_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return ItemResult::NotFound,
        Err(e) => return ItemResult::LookupFailed(e),
    };
    match ensure_acquired(service, settings, &record).await {
        Ok(outcome) => ItemResult::Acquired(record, outcome),
        Err(e) => ItemResult::AddFailed(record, e),
    }
}

/// Look up and add every id. Lookups run `settings.concurrency` at a time;
/// results keep the order of `tmdb_ids`. Individual failures are counted and
/// never stop the phase.
pub async fn acquire_all(
    service: &dyn AcquisitionService,
    settings: &AcquisitionSettings,
    tmdb_ids: &[String],
) -> AcquisitionReport {
    let mut tracker = ProgressTracker::new(tmdb_ids.len(), 25);
    let mut report = AcquisitionReport::default();

    let results: Vec<ItemResult> = stream::iter(tmdb_ids.iter())
        .map(|id| acquire_one(service, settings, id))
        .buffered(settings.concurrency.max(1))
        .collect()
        .await;

    for (idx, (tmdb_id, result)) in tmdb_ids.iter().zip(results).enumerate() {
        match result {
            ItemResult::Acquired(record, AcquisitionOutcome::Added) => {
                info!(tmdb_id = %tmdb_id, title = %record.title, year = record.year, "Added to acquisition service");
                tracker.record_added();
                report.records.push(record);
            }
            ItemResult::Acquired(record, AcquisitionOutcome::AlreadyPresent) => {
                tracker.record_already_present();
                report.records.push(record);
            }
            ItemResult::AddFailed(record, e) => {
                warn!(tmdb_id = %tmdb_id, title = %record.title, error = %e, "Failed to add movie");
                tracker.record_failed_with_error(e.category());
                report.records.push(record);
            }
            ItemResult::NotFound => {
                debug!(tmdb_id = %tmdb_id, "Unknown to acquisition service, skipping");
                report.not_found += 1;
                tracker.record_skipped();
            }
            ItemResult::LookupFailed(e) => {
                warn!(tmdb_id = %tmdb_id, error = %e, "Lookup failed, skipping");
                tracker.record_failed_with_error(e.category());
            }
            ItemResult::Blank => tracker.record_skipped(),
        }
        tracker.log_progress(idx + 1);
    }

    tracker.log_summary("Acquisition");
    report.counts = tracker.counts();
    report
}
