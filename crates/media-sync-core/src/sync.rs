use crate::acquisition::{acquire_all, AcquisitionReport, AcquisitionSettings};
use crate::collection::{add_in_batches, remove_watched, BatchAddReport, RemovalReport};
use crate::resolution::{resolve_library_ids, LibraryIndex};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use media_sync_config::SyncState;
use media_sync_models::{AcquisitionRecord, ScrapeMode, StopReason, UserSyncState};
use media_sync_sources::{AcquisitionService, MediaServer, WatchlistSource};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Serialize)]
pub struct SyncOptions {
    pub force_full_sync: bool,
    /// Full sync when the last one is older than this
    #[serde(skip)]
    pub full_sync_interval: chrono::Duration,
    pub collection_batch_size: usize,
    /// Restrict the run to one configured user
    pub only_user: Option<String>,
}

impl SyncOptions {
    pub fn from_config(options: &media_sync_config::SyncOptions) -> Self {
        Self {
            force_full_sync: false,
            full_sync_interval: chrono::Duration::hours(options.full_sync_interval_hours),
            collection_batch_size: options.collection_batch_size,
            only_user: None,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&media_sync_config::SyncOptions::default())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CurationReport {
    pub removal: Option<RemovalReport>,
    pub additions: BatchAddReport,
    /// Acquired movies not in the library snapshot yet
    pub unmatched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSyncReport {
    pub username: String,
    pub mode: &'static str,
    pub stop_reason: StopReason,
    pub pages_scanned: u32,
    pub new_entries: usize,
    pub cursor: String,
    pub cursor_advanced: bool,
    pub full_sync_recorded: bool,
    pub acquisition: AcquisitionReport,
    /// `None` when the media server user could not be resolved
    pub curation: Option<CurationReport>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub users: Vec<UserSyncReport>,
    pub library_size: usize,
    pub errors: Vec<String>,
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
}

fn serialize_duration_ms<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl SyncResult {
    /// Run-level plus per-user errors
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.users.iter().map(|u| u.errors.len()).sum::<usize>()
    }

    pub fn items_added(&self) -> usize {
        self.users.iter().map(|u| u.acquisition.counts.added).sum()
    }
}

/// Drives one sync pass: library snapshot once, then for each user
/// scrape, cursor update, acquisition, watched removal and collection adds.
pub struct SyncOrchestrator {
    watchlist: Arc<dyn WatchlistSource>,
    acquisition: Arc<dyn AcquisitionService>,
    media_server: Arc<dyn MediaServer>,
    acquisition_settings: AcquisitionSettings,
    options: SyncOptions,
}

impl SyncOrchestrator {
    pub fn new(
        watchlist: Arc<dyn WatchlistSource>,
        acquisition: Arc<dyn AcquisitionService>,
        media_server: Arc<dyn MediaServer>,
        acquisition_settings: AcquisitionSettings,
    ) -> Self {
        Self {
            watchlist,
            acquisition,
            media_server,
            acquisition_settings,
            options: SyncOptions::default(),
        }
    }

    pub fn with_sync_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_force_full_sync(&mut self, force: bool) {
        self.options.force_full_sync = force;
    }

    pub async fn sync(&self, state: &mut SyncState) -> Result<SyncResult> {
        self.sync_at(state, Utc::now()).await
    }

    /// One pass with `now` as the run start. Mutates `state` in place; the
    /// caller persists it.
    #[instrument(skip(self, state))]
    pub async fn sync_at(&self, state: &mut SyncState, now: DateTime<Utc>) -> Result<SyncResult> {
        let start = Instant::now();
        let mut errors = Vec::new();

        if let Some(only) = &self.options.only_user {
            if state.user(only).is_none() {
                return Err(anyhow!("User '{}' is not configured", only));
            }
        }

        info!(
            operation = "sync_start",
            users = state.users.len(),
            source = self.watchlist.source_name(),
            force_full_sync = self.options.force_full_sync,
            "Starting sync"
        );

        let library = match self.media_server.library_movies().await {
            Ok(items) => LibraryIndex::new(&items),
            Err(e) => {
                error!(operation = "library_snapshot", error = %e, "Failed to fetch library, collections will not grow this run");
                errors.push(format!("Failed to fetch {} library: {}", self.media_server.server_name(), e));
                LibraryIndex::empty()
            }
        };

        let mut reports = Vec::new();
        for user in state.users.iter_mut() {
            if let Some(only) = &self.options.only_user {
                if &user.username != only {
                    continue;
                }
            }
            reports.push(self.sync_user(user, &library, now).await);
        }

        let result = SyncResult {
            users: reports,
            library_size: library.len(),
            errors,
            duration: start.elapsed(),
        };
        info!(
            operation = "sync_complete",
            users = result.users.len(),
            added = result.items_added(),
            errors = result.error_count(),
            duration_ms = result.duration.as_millis() as u64,
            "Sync finished"
        );
        Ok(result)
    }

    async fn sync_user(&self, user: &mut UserSyncState, library: &LibraryIndex, now: DateTime<Utc>) -> UserSyncReport {
        let mode = user.scrape_mode(now, self.options.full_sync_interval, self.options.force_full_sync);
        info!(user = %user.username, mode = mode.label(), "Syncing user");

        let outcome = self.watchlist.scrape_watchlist(&user.username, &mode).await;
        let mut errors = Vec::new();
        if let StopReason::FetchFailed { page } = outcome.stop_reason {
            errors.push(format!("Watchlist scrape stopped at page {} after retries", page));
        }

        let (cursor_advanced, full_sync_recorded) = Self::apply_scrape(user, &mode, &outcome, now);

        let acquisition = acquire_all(
            self.acquisition.as_ref(),
            &self.acquisition_settings,
            &outcome.tmdb_ids(),
        )
        .await;

        let curation = self.curate(user, library, &acquisition.records, &mut errors).await;

        UserSyncReport {
            username: user.username.clone(),
            mode: mode.label(),
            stop_reason: outcome.stop_reason,
            pages_scanned: outcome.pages_scanned,
            new_entries: outcome.entries.len(),
            cursor: user.latest_watchlist_movie.clone(),
            cursor_advanced,
            full_sync_recorded,
            acquisition,
            curation,
            errors,
        }
    }

    /// Cursor moves only on a completed, non-empty scrape. The full-sync time
    /// is recorded only when a full scrape completed.
    fn apply_scrape(
        user: &mut UserSyncState,
        mode: &ScrapeMode,
        outcome: &media_sync_models::ScrapeOutcome,
        now: DateTime<Utc>,
    ) -> (bool, bool) {
        let cursor_advanced = match outcome.new_cursor() {
            Some(newest) => user.advance_cursor(newest),
            None => false,
        };
        let full_sync_recorded = mode.is_full() && outcome.completed();
        if full_sync_recorded {
            user.last_full_sync = Some(now);
        }
        if !outcome.completed() {
            warn!(
                user = %user.username,
                collected = outcome.entries.len(),
                "Scrape interrupted, keeping previous cursor"
            );
        }
        (cursor_advanced, full_sync_recorded)
    }

    async fn curate(
        &self,
        user: &UserSyncState,
        library: &LibraryIndex,
        records: &[AcquisitionRecord],
        errors: &mut Vec<String>,
    ) -> Option<CurationReport> {
        let user_id = match self.media_server.find_user_id(&user.jellyfin_username).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!(user = %user.username, media_user = %user.jellyfin_username, "No matching media server user, skipping collection");
                errors.push(format!("Media server user '{}' not found", user.jellyfin_username));
                return None;
            }
            Err(e) => {
                warn!(user = %user.username, error = %e, "Failed to list media server users, skipping collection");
                errors.push(format!("Failed to list media server users: {}", e));
                return None;
            }
        };

        let removal = match remove_watched(self.media_server.as_ref(), &user_id, &user.collection_id).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(user = %user.username, error = %e, "Failed to remove watched movies");
                errors.push(format!("{:#}", e));
                None
            }
        };

        let (ids, unmatched) = resolve_library_ids(library, records);
        let additions = add_in_batches(
            self.media_server.as_ref(),
            &user.collection_id,
            &ids,
            self.options.collection_batch_size,
        )
        .await;
        if additions.failed_batches > 0 {
            errors.push(format!("{} collection batch(es) failed", additions.failed_batches));
        }

        Some(CurationReport {
            removal,
            additions,
            unmatched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{outcome, record, FakeAcquisition, FakeMediaServer, FakeWatchlist};
    use chrono::TimeZone;

    fn settings() -> AcquisitionSettings {
        AcquisitionSettings {
            quality_profile_id: 11,
            movies_root: "/movies".to_string(),
            anime_movies_root: "/anime_movies".to_string(),
            concurrency: 1,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    /// Fully synced an hour ago with cursor `c`
    fn incremental_user() -> UserSyncState {
        let mut user = UserSyncState::new("alice", "col-a", "Alice");
        user.latest_watchlist_movie = "c".to_string();
        user.last_full_sync = Some(now() - chrono::Duration::hours(1));
        user
    }

    fn state(users: Vec<UserSyncState>) -> SyncState {
        SyncState { users }
    }

    fn orchestrator(
        watchlist: &Arc<FakeWatchlist>,
        acquisition: &Arc<FakeAcquisition>,
        server: &Arc<FakeMediaServer>,
    ) -> SyncOrchestrator {
        SyncOrchestrator::new(watchlist.clone(), acquisition.clone(), server.clone(), settings())
    }

    #[tokio::test]
    async fn test_incremental_run_end_to_end() {
        let watchlist = Arc::new(FakeWatchlist::default().with("alice", outcome(&["a", "b"], StopReason::CursorReached)));
        let acquisition = Arc::new(
            FakeAcquisition::default()
                .with("a", vec![record(1, "Heat", 1995)])
                .with("b", vec![record(2, "Ronin", 1998)]),
        );
        let server = Arc::new(
            FakeMediaServer::default()
                .with_user("jf-1", "Alice")
                .with_movie("lib-heat", "Heat", 1995)
                .with_member("col-a", "old-watched", true)
                .with_member("col-a", "old-unwatched", false),
        );
        let mut state = state(vec![incremental_user()]);

        let result = orchestrator(&watchlist, &acquisition, &server)
            .sync_at(&mut state, now())
            .await
            .unwrap();

        assert_eq!(watchlist.calls()[0].1, ScrapeMode::incremental("c"));
        let user = state.user("alice").unwrap();
        assert_eq!(user.latest_watchlist_movie, "a");
        assert_eq!(user.last_full_sync, Some(now() - chrono::Duration::hours(1)));

        assert_eq!(acquisition.adds().len(), 2);
        assert_eq!(server.removed(), vec![("col-a".to_string(), "old-watched".to_string())]);
        // Ronin is not in the library yet
        assert_eq!(server.added(), vec![("col-a".to_string(), vec!["lib-heat".to_string()])]);

        let report = &result.users[0];
        assert!(report.cursor_advanced);
        assert_eq!(report.curation.as_ref().unwrap().unmatched, 1);
        assert_eq!(result.error_count(), 0);
    }

    #[tokio::test]
    async fn test_no_new_entries_keeps_cursor() {
        let watchlist = Arc::new(FakeWatchlist::default().with("alice", outcome(&[], StopReason::CursorReached)));
        let acquisition = Arc::new(FakeAcquisition::default());
        let server = Arc::new(FakeMediaServer::default().with_user("jf-1", "Alice"));
        let mut state = state(vec![incremental_user()]);

        let result = orchestrator(&watchlist, &acquisition, &server)
            .sync_at(&mut state, now())
            .await
            .unwrap();

        assert_eq!(state.user("alice").unwrap().latest_watchlist_movie, "c");
        assert!(!result.users[0].cursor_advanced);
        assert!(acquisition.lookups().is_empty());
        assert!(server.added().is_empty());
    }

    #[tokio::test]
    async fn test_interrupted_scrape_keeps_cursor_but_acquires() {
        let watchlist = Arc::new(
            FakeWatchlist::default().with("alice", outcome(&["a", "b"], StopReason::FetchFailed { page: 2 })),
        );
        let acquisition = Arc::new(FakeAcquisition::default().with("a", vec![record(1, "Heat", 1995)]));
        let server = Arc::new(FakeMediaServer::default().with_user("jf-1", "Alice"));
        let mut user = UserSyncState::new("alice", "col-a", "Alice");
        user.latest_watchlist_movie = "old".to_string();
        let mut state = state(vec![user]);

        let result = orchestrator(&watchlist, &acquisition, &server)
            .sync_at(&mut state, now())
            .await
            .unwrap();

        let user = state.user("alice").unwrap();
        assert_eq!(user.latest_watchlist_movie, "old");
        // Never fully synced before, and this full scrape did not complete
        assert_eq!(user.last_full_sync, None);
        assert_eq!(acquisition.lookups(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(result.users[0].errors.len(), 1);
    }

    #[tokio::test]
    async fn test_full_sync_when_due_records_time() {
        let watchlist = Arc::new(FakeWatchlist::default().with("alice", outcome(&["z", "a"], StopReason::ShortPage)));
        let acquisition = Arc::new(FakeAcquisition::default());
        let server = Arc::new(FakeMediaServer::default().with_user("jf-1", "Alice"));
        let mut user = incremental_user();
        user.last_full_sync = Some(now() - chrono::Duration::hours(25));
        let mut state = state(vec![user]);

        let result = orchestrator(&watchlist, &acquisition, &server)
            .sync_at(&mut state, now())
            .await
            .unwrap();

        assert_eq!(watchlist.calls()[0].1, ScrapeMode::Full);
        let user = state.user("alice").unwrap();
        assert_eq!(user.last_full_sync, Some(now()));
        assert_eq!(user.latest_watchlist_movie, "z");
        assert!(result.users[0].full_sync_recorded);
    }

    #[tokio::test]
    async fn test_force_full_sync() {
        let watchlist = Arc::new(FakeWatchlist::default());
        let acquisition = Arc::new(FakeAcquisition::default());
        let server = Arc::new(FakeMediaServer::default().with_user("jf-1", "Alice"));
        let mut state = state(vec![incremental_user()]);

        let mut sync = orchestrator(&watchlist, &acquisition, &server);
        sync.set_force_full_sync(true);
        sync.sync_at(&mut state, now()).await.unwrap();

        assert_eq!(watchlist.calls()[0].1, ScrapeMode::Full);
        // Empty but complete full scrape still counts as a full sync
        assert_eq!(state.user("alice").unwrap().last_full_sync, Some(now()));
        assert_eq!(state.user("alice").unwrap().latest_watchlist_movie, "c");
    }

    #[tokio::test]
    async fn test_missing_media_user_skips_curation_only() {
        let watchlist = Arc::new(FakeWatchlist::default().with("alice", outcome(&["a"], StopReason::ShortPage)));
        let acquisition = Arc::new(FakeAcquisition::default().with("a", vec![record(1, "Heat", 1995)]));
        let server = Arc::new(
            FakeMediaServer::default()
                .with_user("jf-2", "Bob")
                .with_movie("lib-heat", "Heat", 1995)
                .with_member("col-a", "w", true),
        );
        let mut state = state(vec![incremental_user()]);

        let result = orchestrator(&watchlist, &acquisition, &server)
            .sync_at(&mut state, now())
            .await
            .unwrap();

        assert_eq!(acquisition.adds().len(), 1);
        assert!(server.removed().is_empty());
        assert!(server.added().is_empty());
        assert!(result.users[0].curation.is_none());
        assert_eq!(result.error_count(), 1);
    }

    #[tokio::test]
    async fn test_library_fetched_once_for_all_users() {
        let watchlist = Arc::new(
            FakeWatchlist::default()
                .with("alice", outcome(&["a"], StopReason::ShortPage))
                .with("bob", outcome(&["a"], StopReason::ShortPage)),
        );
        let acquisition = Arc::new(FakeAcquisition::default().with("a", vec![record(1, "Heat", 1995)]));
        let server = Arc::new(
            FakeMediaServer::default()
                .with_user("jf-1", "Alice")
                .with_user("jf-2", "Bob")
                .with_movie("lib-heat", "Heat", 1995),
        );
        let mut state = state(vec![
            UserSyncState::new("alice", "col-a", "Alice"),
            UserSyncState::new("bob", "col-b", "Bob"),
        ]);

        let result = orchestrator(&watchlist, &acquisition, &server)
            .sync_at(&mut state, now())
            .await
            .unwrap();

        assert_eq!(server.library_calls(), 1);
        assert_eq!(result.users.len(), 2);
        let collections: Vec<String> = server.added().into_iter().map(|(c, _)| c).collect();
        assert_eq!(collections, vec!["col-a".to_string(), "col-b".to_string()]);
    }

    #[tokio::test]
    async fn test_only_user_filter() {
        let watchlist = Arc::new(FakeWatchlist::default());
        let acquisition = Arc::new(FakeAcquisition::default());
        let server = Arc::new(FakeMediaServer::default());
        let mut state = state(vec![
            UserSyncState::new("alice", "col-a", "Alice"),
            UserSyncState::new("bob", "col-b", "Bob"),
        ]);

        let options = SyncOptions {
            only_user: Some("bob".to_string()),
            ..SyncOptions::default()
        };
        let sync = orchestrator(&watchlist, &acquisition, &server).with_sync_options(options);
        let result = sync.sync_at(&mut state, now()).await.unwrap();
        assert_eq!(result.users.len(), 1);
        assert_eq!(watchlist.calls()[0].0, "bob");

        let options = SyncOptions {
            only_user: Some("carol".to_string()),
            ..SyncOptions::default()
        };
        let sync = orchestrator(&watchlist, &acquisition, &server).with_sync_options(options);
        assert!(sync.sync_at(&mut state, now()).await.is_err());
    }

    #[test]
    fn test_result_serializes() {
        let result = SyncResult {
            users: Vec::new(),
            library_size: 3,
            errors: vec!["boom".to_string()],
            duration: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["duration_ms"], 1500);
        assert_eq!(json["library_size"], 3);
    }
}
