use super::{load_credentials, load_env, mask_secret, prompts};
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use media_sync_config::{default_scheduler_config, Config, CredentialStore, PathManager};
use serde_json::json;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    match cmd {
        ConfigCommands::Show => show_config(&path_manager, output),
        ConfigCommands::Init { force } => init_config(&path_manager, force, output),
        ConfigCommands::Credentials {
            radarr_api_key,
            jellyfin_api_key,
            proxy_user,
        } => configure_credentials(&path_manager, radarr_api_key, jellyfin_api_key, proxy_user, output),
    }
}

fn section(title: &str, rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(""),
    ]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

fn secret_status(value: Option<&String>) -> String {
    value
        .map(|v| mask_secret(v))
        .unwrap_or_else(|| "not set".to_string())
}

fn show_config(path_manager: &PathManager, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Create one with `watchsync config init`.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    load_env(path_manager);
    let credentials = load_credentials(path_manager)?;
    let scheduler = config.scheduler.clone().unwrap_or_else(default_scheduler_config);
    let proxy = config
        .proxy_url()
        .map(str::to_string)
        .or_else(|| credentials.get_proxy_url().cloned());

    if !output.is_human() {
        output.data(&json!({
            "config_file": config_file.display().to_string(),
            "state_file": path_manager.state_file().display().to_string(),
            "config": config,
            "credentials": {
                "radarr_api_key": secret_status(credentials.get_radarr_api_key()),
                "jellyfin_api_key": secret_status(credentials.get_jellyfin_api_key()),
                "proxy_url": proxy,
                "proxy_user": credentials.get_proxy_user(),
            },
        }));
        return Ok(());
    }

    output.table(section(
        "Files",
        vec![
            ("Config", config_file.display().to_string()),
            ("Credentials", path_manager.credentials_file().display().to_string()),
            ("State", path_manager.state_file().display().to_string()),
            ("Daemon log", path_manager.daemon_log_file().display().to_string()),
        ],
    ));
    output.table(section(
        "Letterboxd",
        vec![
            ("Base URL", config.letterboxd.base_url.clone()),
            ("Use proxy", config.letterboxd.use_proxy.to_string()),
            ("Page size", config.letterboxd.page_size.to_string()),
            ("Politeness delay", format!("{} ms", config.letterboxd.politeness_delay_ms)),
            (
                "Retry",
                format!(
                    "{} attempts, {:?} {} ms",
                    config.letterboxd.retry.max_attempts, config.letterboxd.retry.strategy, config.letterboxd.retry.backoff_ms
                ),
            ),
        ],
    ));
    output.table(section(
        "Radarr",
        vec![
            ("URL", config.radarr.url.clone()),
            ("API key", secret_status(credentials.get_radarr_api_key())),
            ("Quality profile", config.radarr.quality_profile_id.to_string()),
            ("Movies root", config.radarr.root_folders.movies.clone()),
            ("Anime root", config.radarr.root_folders.anime_movies.clone()),
        ],
    ));
    output.table(section(
        "Jellyfin",
        vec![
            ("URL", config.jellyfin.url.clone()),
            ("API key", secret_status(credentials.get_jellyfin_api_key())),
        ],
    ));
    output.table(section(
        "Sync",
        vec![
            ("Proxy", proxy.unwrap_or_else(|| "none".to_string())),
            ("Full sync every", format!("{} h", config.sync.full_sync_interval_hours)),
            ("Acquisition concurrency", config.sync.acquisition_concurrency.to_string()),
            ("Collection batch size", config.sync.collection_batch_size.to_string()),
            ("Request timeout", format!("{} s", config.sync.request_timeout_secs)),
            ("Daemon interval", format!("{} min", scheduler.interval_minutes)),
        ],
    ));
    Ok(())
}

fn init_config(path_manager: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = path_manager.config_file();
    if config_file.exists()
        && !force
        && !prompts::prompt_yes_no(&format!("{} exists. Overwrite?", config_file.display()), false)?
    {
        output.info("Left existing configuration unchanged.");
        return Ok(());
    }

    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;
    Config::template()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote configuration template to {}", config_file.display()));
    output.info("Set the Radarr root folders and Jellyfin URL, then run `watchsync config credentials`.");
    Ok(())
}

/// Empty answers keep the stored value
fn apply_secret(value: String, set: impl FnOnce(String)) -> bool {
    let value = value.trim().to_string();
    if value.is_empty() {
        return false;
    }
    set(value);
    true
}

fn configure_credentials(
    path_manager: &PathManager,
    radarr_api_key: Option<String>,
    jellyfin_api_key: Option<String>,
    proxy_user: Option<String>,
    output: &Output,
) -> Result<()> {
    // Stored values only; environment overrides must not end up on disk
    let mut store = CredentialStore::new(path_manager.credentials_file());
    store
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let radarr = match radarr_api_key {
        Some(key) => key,
        None => prompts::prompt_secret("Radarr API key (empty keeps current)")?,
    };
    let mut changed = apply_secret(radarr, |v| store.set_radarr_api_key(v));

    let jellyfin = match jellyfin_api_key {
        Some(key) => key,
        None => prompts::prompt_secret("Jellyfin API key (empty keeps current)")?,
    };
    changed |= apply_secret(jellyfin, |v| store.set_jellyfin_api_key(v));

    if let Some(user) = proxy_user.filter(|u| !u.is_empty()) {
        let pass = prompts::prompt_secret("Proxy password")?;
        store.set_proxy_auth(user, pass);
        changed = true;
    }

    if !changed {
        output.info("No credentials changed.");
        return Ok(());
    }
    store
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    output.success(format!("Credentials saved to {}", path_manager.credentials_file().display()));
    Ok(())
}
