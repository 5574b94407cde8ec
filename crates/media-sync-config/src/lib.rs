pub mod config;
pub mod credentials;
pub mod lock;
pub mod paths;
pub mod state;

pub use config::{BackoffStrategy, Config, JellyfinConfig, LetterboxdConfig, ProxyConfig, RadarrConfig, RetryConfig, RootFolders, SchedulerConfig, SyncOptions, default_scheduler_config};
pub use credentials::CredentialStore;
pub use lock::{LockError, RunLock};
pub use paths::{PathManager, container_base_path};
pub use state::{StateStore, SyncState};
