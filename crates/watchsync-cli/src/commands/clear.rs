use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_sync_config::{PathManager, RunLock};
use std::fs;
use std::path::Path;

pub fn run_clear(all: bool, state: bool, lock: bool, credentials: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if !(all || state || lock || credentials) {
        output.warn("No clear option specified. Use --state, --lock, --credentials, or --all");
        output.info("Example: watchsync clear --lock");
        return Ok(());
    }

    // The lock goes first so a stale lock does not block clearing state
    if all || lock {
        clear_lock(&path_manager, output)?;
    }
    if all || state {
        clear_state(&path_manager, output)?;
    }
    if all || credentials {
        clear_credentials(&path_manager, output)?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(eyre!("Failed to remove {}: {}", path.display(), e)),
    }
}

fn clear_lock(path_manager: &PathManager, output: &Output) -> Result<()> {
    let lock_file = path_manager.lock_file();
    let released = RunLock::force_release(&lock_file)
        .map_err(|e| eyre!("Failed to remove lock at {}: {}", lock_file.display(), e))?;
    if released {
        output.success(format!("Run lock released: {}", lock_file.display()));
    } else {
        output.info("No run lock held");
    }
    Ok(())
}

fn clear_state(path_manager: &PathManager, output: &Output) -> Result<()> {
    // Refuses while a sync is running
    let _lock = RunLock::acquire(path_manager.lock_file())?;
    if remove_if_exists(&path_manager.state_file())? {
        output.success("Sync state cleared (users and cursors removed)");
    } else {
        output.info("No sync state to clear");
    }
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    if remove_if_exists(&path_manager.credentials_file())? {
        output.success("Credentials cleared");
    } else {
        output.info("No stored credentials to clear");
    }
    Ok(())
}
