use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub letterboxd: LetterboxdConfig,
    pub radarr: RadarrConfig,
    pub jellyfin: JellyfinConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterboxdConfig {
    #[serde(default = "default_letterboxd_url")]
    pub base_url: String,
    /// Route watchlist requests through the SOCKS proxy
    #[serde(default = "default_true")]
    pub use_proxy: bool,
    /// Number of posters on a full watchlist page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Pause after each resolved film page
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default)]
    pub strategy: BackoffStrategy,
    /// Upper bound for exponential backoff
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarrConfig {
    /// Base API url, e.g. http://localhost:7878/api/v3/
    #[serde(default = "default_radarr_url")]
    pub url: String,
    #[serde(default = "default_quality_profile_id")]
    pub quality_profile_id: u32,
    pub root_folders: RootFolders,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootFolders {
    pub movies: String,
    pub anime_movies: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JellyfinConfig {
    pub url: String,
}

/// SOCKS5 proxy. Credentials come from the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// host:port
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "default_full_sync_interval_hours")]
    pub full_sync_interval_hours: i64,
    /// Parallel acquisition lookups. 1 keeps the lookups sequential.
    #[serde(default = "default_acquisition_concurrency")]
    pub acquisition_concurrency: usize,
    #[serde(default = "default_collection_batch_size")]
    pub collection_batch_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

fn default_true() -> bool {
    true
}

fn default_letterboxd_url() -> String {
    "https://letterboxd.com/".to_string()
}

fn default_radarr_url() -> String {
    "http://localhost:7878/api/v3/".to_string()
}

fn default_page_size() -> usize {
    28
}

fn default_politeness_delay_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    2000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_quality_profile_id() -> u32 {
    11
}

fn default_full_sync_interval_hours() -> i64 {
    24
}

fn default_acquisition_concurrency() -> usize {
    1
}

fn default_collection_batch_size() -> usize {
    20
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_interval_minutes() -> u64 {
    60
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        interval_minutes: default_interval_minutes(),
        run_on_startup: default_true(),
    }
}

impl Default for LetterboxdConfig {
    fn default() -> Self {
        Self {
            base_url: default_letterboxd_url(),
            use_proxy: default_true(),
            page_size: default_page_size(),
            politeness_delay_ms: default_politeness_delay_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            strategy: BackoffStrategy::default(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            full_sync_interval_hours: default_full_sync_interval_hours(),
            acquisition_concurrency: default_acquisition_concurrency(),
            collection_batch_size: default_collection_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Starting point written by `watchsync config init`
    pub fn template() -> Self {
        Self {
            letterboxd: LetterboxdConfig::default(),
            radarr: RadarrConfig {
                url: default_radarr_url(),
                quality_profile_id: default_quality_profile_id(),
                root_folders: RootFolders {
                    movies: "/movies".to_string(),
                    anime_movies: "/anime_movies".to_string(),
                },
            },
            jellyfin: JellyfinConfig {
                url: "http://localhost:8096/".to_string(),
            },
            proxy: None,
            sync: SyncOptions::default(),
            scheduler: None,
        }
    }

    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.letterboxd.base_url.is_empty() {
            return Err(anyhow::anyhow!("letterboxd.base_url cannot be empty"));
        }
        if self.letterboxd.page_size == 0 {
            return Err(anyhow::anyhow!("letterboxd.page_size must be greater than zero"));
        }
        if self.letterboxd.retry.max_attempts == 0 {
            return Err(anyhow::anyhow!("letterboxd.retry.max_attempts must be at least 1"));
        }
        if self.radarr.url.is_empty() {
            return Err(anyhow::anyhow!("radarr.url cannot be empty"));
        }
        if self.radarr.root_folders.movies.is_empty() || self.radarr.root_folders.anime_movies.is_empty() {
            return Err(anyhow::anyhow!("radarr.root_folders must define both movies and anime_movies"));
        }
        if self.jellyfin.url.is_empty() {
            return Err(anyhow::anyhow!("jellyfin.url cannot be empty"));
        }
        if self.sync.collection_batch_size == 0 {
            return Err(anyhow::anyhow!("sync.collection_batch_size must be greater than zero"));
        }
        if self.sync.acquisition_concurrency == 0 {
            return Err(anyhow::anyhow!("sync.acquisition_concurrency must be at least 1"));
        }
        if self.sync.full_sync_interval_hours < 0 {
            return Err(anyhow::anyhow!("sync.full_sync_interval_hours must be non-negative"));
        }
        if let Some(proxy) = &self.proxy {
            if proxy.url.is_empty() {
                return Err(anyhow::anyhow!("proxy.url cannot be empty when [proxy] is present"));
            }
        }
        Ok(())
    }

    /// Proxy url from the config file, if any
    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy.as_ref().map(|p| p.url.as_str()).filter(|u| !u.is_empty())
    }
}
