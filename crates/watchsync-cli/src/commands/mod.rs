pub mod clear;
pub mod config;
pub mod daemon;
pub mod prompts;
pub mod sync;
pub mod users;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_sync_config::{Config, CredentialStore, PathManager};
use tracing::debug;

/// Load `.env` from the config directory, then from the working directory.
/// Variables already set in the process environment win.
pub fn load_env(path_manager: &PathManager) {
    let env_file = path_manager.env_file();
    if env_file.exists() {
        match dotenvy::from_path(&env_file) {
            Ok(()) => debug!(path = %env_file.display(), "Loaded environment file"),
            Err(e) => debug!(path = %env_file.display(), error = %e, "Failed to load environment file"),
        }
    }
    let _ = dotenvy::dotenv();
}

pub fn load_config(path_manager: &PathManager) -> Result<Config> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        return Err(eyre!(
            "No configuration at {}. Run `watchsync config init` first.",
            config_file.display()
        ));
    }
    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config.validate().map_err(|e| eyre!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Stored credentials with environment overrides applied
pub fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let mut store = CredentialStore::new(path_manager.credentials_file());
    store
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    let applied = store.apply_env_overrides(|key| std::env::var(key).ok());
    if applied > 0 {
        debug!(count = applied, "Credentials overridden from environment");
    }
    Ok(store)
}

/// Keep the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
