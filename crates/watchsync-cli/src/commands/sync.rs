use crate::commands::{load_config, load_credentials, load_env};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use media_sync_config::{Config, CredentialStore, PathManager, RunLock, StateStore};
use media_sync_core::{AcquisitionSettings, SyncOptions, SyncOrchestrator, SyncResult, UserSyncReport};
use media_sync_models::StopReason;
use media_sync_sources::{FetchClient, HttpFetcher, JellyfinClient, LetterboxdScraper, ProxySettings, RadarrClient, ScraperSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub async fn run_sync(force_full_sync: bool, only_user: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    load_env(&path_manager);
    let config = load_config(&path_manager)?;

    let result = execute_sync(&config, &path_manager, force_full_sync, only_user).await?;
    report(&result, output);
    Ok(())
}

/// One full pass under the run lock. State is loaded after the lock is
/// taken and persisted before it is released.
pub async fn execute_sync(
    config: &Config,
    path_manager: &PathManager,
    force_full_sync: bool,
    only_user: Option<String>,
) -> Result<SyncResult> {
    let _lock = RunLock::acquire(path_manager.lock_file())?;

    let store = StateStore::new(path_manager.state_file());
    let mut state = store
        .load()
        .map_err(|e| eyre!("Failed to load sync state: {:#}", e))?;
    if state.users.is_empty() {
        warn!("No users configured; add one with `watchsync users add`");
    }

    let credentials = load_credentials(path_manager)?;
    let orchestrator = build_orchestrator(config, &credentials, force_full_sync, only_user)?;

    let result = orchestrator
        .sync(&mut state)
        .await
        .map_err(|e| eyre!("Sync failed: {:#}", e))?;

    store
        .persist(&state)
        .map_err(|e| eyre!("Failed to persist sync state: {:#}", e))?;

    info!(
        users = result.users.len(),
        added = result.items_added(),
        errors = result.error_count(),
        duration_ms = result.duration.as_millis() as u64,
        "Sync pass complete"
    );
    Ok(result)
}

fn proxy_settings(config: &Config, credentials: &CredentialStore) -> Option<ProxySettings> {
    let url = config
        .proxy_url()
        .map(str::to_string)
        .or_else(|| credentials.get_proxy_url().cloned())?;
    Some(ProxySettings::new(url).with_auth(credentials.get_proxy_user().cloned(), credentials.get_proxy_pass().cloned()))
}

pub fn build_orchestrator(
    config: &Config,
    credentials: &CredentialStore,
    force_full_sync: bool,
    only_user: Option<String>,
) -> Result<SyncOrchestrator> {
    let radarr_key = credentials
        .get_radarr_api_key()
        .ok_or_else(|| eyre!("Radarr API key missing. Set RADARR_API_KEY or run `watchsync config credentials`."))?;
    let jellyfin_key = credentials
        .get_jellyfin_api_key()
        .ok_or_else(|| eyre!("Jellyfin API key missing. Set JELLYFIN_API_KEY or run `watchsync config credentials`."))?;

    let proxy = proxy_settings(config, credentials);
    if config.letterboxd.use_proxy && proxy.is_none() {
        debug!("letterboxd.use_proxy is set but no proxy is configured, scraping directly");
    }

    let timeout = Duration::from_secs(config.sync.request_timeout_secs);
    let fetcher: Arc<dyn FetchClient> = Arc::new(
        HttpFetcher::new(timeout, proxy).map_err(|e| eyre!("Failed to build HTTP client: {:#}", e))?,
    );

    let scraper = LetterboxdScraper::new(fetcher.clone(), ScraperSettings::from_config(&config.letterboxd));
    let radarr = RadarrClient::new(fetcher.clone(), config.radarr.url.as_str(), radarr_key.as_str());
    let jellyfin = JellyfinClient::new(fetcher, config.jellyfin.url.as_str(), jellyfin_key.as_str());

    let mut options = SyncOptions::from_config(&config.sync);
    options.force_full_sync = force_full_sync;
    options.only_user = only_user;

    Ok(SyncOrchestrator::new(
        Arc::new(scraper),
        Arc::new(radarr),
        Arc::new(jellyfin),
        AcquisitionSettings::from_config(&config.radarr, &config.sync),
    )
    .with_sync_options(options))
}

fn describe_stop(reason: StopReason) -> String {
    match reason {
        StopReason::ShortPage => "end of watchlist".to_string(),
        StopReason::CursorReached => "cursor reached".to_string(),
        StopReason::FetchFailed { page } => format!("page {} failed", page),
    }
}

fn collection_summary(user: &UserSyncReport) -> String {
    match &user.curation {
        Some(curation) => {
            let removed = curation.removal.map(|r| r.removed).unwrap_or(0);
            format!("+{} / -{}", curation.additions.added, removed)
        }
        None => "skipped".to_string(),
    }
}

pub fn report(result: &SyncResult, output: &Output) {
    if !output.is_human() {
        output.data(result);
        return;
    }

    if !result.users.is_empty() {
        let mut table = Table::new();
        table.set_header(
            ["User", "Mode", "Stopped", "New", "Added", "Present", "Failed", "Collection"]
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
        for user in &result.users {
            let counts = &user.acquisition.counts;
            table.add_row(vec![
                user.username.clone(),
                user.mode.to_string(),
                describe_stop(user.stop_reason),
                user.new_entries.to_string(),
                counts.added.to_string(),
                counts.already_present.to_string(),
                counts.failed.to_string(),
                collection_summary(user),
            ]);
        }
        output.table(table);
    }

    for error in result
        .errors
        .iter()
        .chain(result.users.iter().flat_map(|u| u.errors.iter()))
    {
        output.warn(error);
    }

    let summary = format!(
        "Synced {} user(s) in {:.1}s: {} movie(s) requested, {} error(s)",
        result.users.len(),
        result.duration.as_secs_f64(),
        result.items_added(),
        result.error_count()
    );
    if result.error_count() == 0 {
        output.success(summary);
    } else {
        output.warn(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_sync_config::ProxyConfig;
    use std::path::PathBuf;

    #[test]
    fn test_config_proxy_wins_over_environment() {
        let mut config = Config::template();
        config.proxy = Some(ProxyConfig {
            url: "10.0.0.1:1080".to_string(),
        });
        let mut credentials = CredentialStore::new(PathBuf::from("/tmp/unused"));
        credentials.set("proxy_url".to_string(), "10.0.0.2:1080".to_string());

        let proxy = proxy_settings(&config, &credentials).unwrap();
        assert_eq!(proxy.url, "10.0.0.1:1080");

        config.proxy = None;
        let proxy = proxy_settings(&config, &credentials).unwrap();
        assert_eq!(proxy.url, "10.0.0.2:1080");
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let credentials = CredentialStore::new(PathBuf::from("/tmp/unused"));
        let err = build_orchestrator(&Config::template(), &credentials, false, None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("RADARR_API_KEY"));
    }

    #[test]
    fn test_build_orchestrator_with_credentials() {
        let mut credentials = CredentialStore::new(PathBuf::from("/tmp/unused"));
        credentials.set_radarr_api_key("r".to_string());
        credentials.set_jellyfin_api_key("j".to_string());
        assert!(build_orchestrator(&Config::template(), &credentials, true, Some("alice".to_string())).is_ok());
    }

    #[tokio::test]
    async fn test_lock_contention_leaves_state_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());
        let _held = RunLock::acquire(paths.lock_file()).unwrap();

        let err = execute_sync(&Config::template(), &paths, false, None).await.unwrap_err();
        assert!(err.to_string().contains("another run holds the lock"));
        assert!(!paths.state_file().exists());
    }
}
