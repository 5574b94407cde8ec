use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::sync_mode::ScrapeMode;

/// Per-user sync record, loaded at run start and persisted at run end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSyncState {
    /// Watchlist owner on the film-tracking site
    pub username: String,
    /// Identifier of the newest watchlist entry seen by the last successful scrape.
    /// Empty means the user was never synced.
    #[serde(default)]
    pub latest_watchlist_movie: String,
    #[serde(default)]
    pub last_full_sync: Option<DateTime<Utc>>,
    /// Media server collection curated for this user
    pub collection_id: String,
    /// Name of the matching account on the media server
    pub jellyfin_username: String,
}

impl UserSyncState {
    pub fn new(
        username: impl Into<String>,
        collection_id: impl Into<String>,
        jellyfin_username: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            latest_watchlist_movie: String::new(),
            last_full_sync: None,
            collection_id: collection_id.into(),
            jellyfin_username: jellyfin_username.into(),
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        if self.latest_watchlist_movie.is_empty() {
            None
        } else {
            Some(&self.latest_watchlist_movie)
        }
    }

    /// True when the last full sync is unknown or older than `interval`
    pub fn full_sync_due(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        match self.last_full_sync {
            None => true,
            Some(last) => now - last > interval,
        }
    }

    /// Pick the scrape mode for this run
    pub fn scrape_mode(&self, now: DateTime<Utc>, interval: Duration, force_full: bool) -> ScrapeMode {
        if force_full || self.full_sync_due(now, interval) {
            ScrapeMode::Full
        } else {
            ScrapeMode::incremental(self.latest_watchlist_movie.clone())
        }
    }

    /// Move the cursor forward. Empty identifiers are ignored so an empty
    /// scrape can never erase an existing cursor.
    pub fn advance_cursor(&mut self, newest: &str) -> bool {
        if newest.is_empty() || newest == self.latest_watchlist_movie {
            return false;
        }
        self.latest_watchlist_movie = newest.to_string();
        true
    }

    pub fn reset_cursor(&mut self) {
        self.latest_watchlist_movie.clear();
        self.last_full_sync = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sync_due() {
        let now = Utc::now();
        let mut user = UserSyncState::new("alice", "col1", "Alice");
        assert!(user.full_sync_due(now, Duration::hours(24)));

        user.last_full_sync = Some(now - Duration::hours(2));
        assert!(!user.full_sync_due(now, Duration::hours(24)));

        user.last_full_sync = Some(now - Duration::hours(25));
        assert!(user.full_sync_due(now, Duration::hours(24)));
    }

    #[test]
    fn test_scrape_mode_selection() {
        let now = Utc::now();
        let mut user = UserSyncState::new("alice", "col1", "Alice");
        user.latest_watchlist_movie = "603".to_string();
        user.last_full_sync = Some(now - Duration::hours(1));

        assert_eq!(
            user.scrape_mode(now, Duration::hours(24), false),
            ScrapeMode::incremental("603")
        );
        assert_eq!(user.scrape_mode(now, Duration::hours(24), true), ScrapeMode::Full);
    }

    #[test]
    fn test_advance_cursor_ignores_empty() {
        let mut user = UserSyncState::new("alice", "col1", "Alice");
        user.latest_watchlist_movie = "603".to_string();

        assert!(!user.advance_cursor(""));
        assert_eq!(user.cursor(), Some("603"));

        assert!(user.advance_cursor("27205"));
        assert_eq!(user.cursor(), Some("27205"));
    }
}
