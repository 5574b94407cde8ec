use anyhow::{anyhow, Context, Result};
use media_sync_models::UserSyncState;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Everything that changes between runs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncState {
    #[serde(default)]
    pub users: Vec<UserSyncState>,
}

impl SyncState {
    pub fn user(&self, username: &str) -> Option<&UserSyncState> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn user_mut(&mut self, username: &str) -> Option<&mut UserSyncState> {
        self.users.iter_mut().find(|u| u.username == username)
    }

    pub fn add_user(&mut self, user: UserSyncState) -> Result<()> {
        if self.user(&user.username).is_some() {
            return Err(anyhow!("User '{}' is already configured", user.username));
        }
        self.users.push(user);
        Ok(())
    }

    pub fn remove_user(&mut self, username: &str) -> Option<UserSyncState> {
        let index = self.users.iter().position(|u| u.username == username)?;
        Some(self.users.remove(index))
    }
}

/// Loads and persists [`SyncState`] as JSON.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous state intact.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// A missing file is an empty state
    pub fn load(&self) -> Result<SyncState> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file yet, starting empty");
            return Ok(SyncState::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file {}", self.path.display()))?;
        let state: SyncState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", self.path.display()))?;
        Ok(state)
    }

    pub fn persist(&self, state: &SyncState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;

        let tmp_path = self.tmp_path();
        {
            let mut file = std::fs::File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace state file {}", self.path.display()))?;

        debug!(path = %self.path.display(), users = state.users.len(), "State persisted");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_missing_state_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), SyncState::default());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));

        let mut state = SyncState::default();
        let mut user = UserSyncState::new("alice", "col-1", "Alice");
        user.latest_watchlist_movie = "603".to_string();
        user.last_full_sync = Some(Utc::now());
        state.add_user(user.clone()).unwrap();

        store.persist(&state).unwrap();
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.user("alice"), Some(&user));
    }

    #[test]
    fn test_add_duplicate_user_fails() {
        let mut state = SyncState::default();
        state.add_user(UserSyncState::new("alice", "c1", "Alice")).unwrap();
        assert!(state.add_user(UserSyncState::new("alice", "c2", "Alice")).is_err());
        assert!(state.remove_user("alice").is_some());
        assert!(state.remove_user("alice").is_none());
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(StateStore::new(path).load().is_err());
    }
}
