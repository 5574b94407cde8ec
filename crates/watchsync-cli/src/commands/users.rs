use crate::commands::prompts;
use crate::output::Output;
use crate::UsersCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use media_sync_config::{PathManager, RunLock, StateStore, SyncState};
use media_sync_models::UserSyncState;
use serde_json::json;

pub fn run_users(cmd: UsersCommands, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    match cmd {
        UsersCommands::List => list_users(&path_manager, output),
        UsersCommands::Add {
            username,
            collection_id,
            jellyfin_user,
        } => {
            let collection_id = match collection_id {
                Some(id) => id,
                None => prompts::prompt_string("Jellyfin collection id", None)?,
            };
            let jellyfin_user = jellyfin_user.unwrap_or_else(|| username.clone());
            modify_state(&path_manager, |state| {
                state
                    .add_user(UserSyncState::new(username.clone(), collection_id, jellyfin_user))
                    .map_err(|e| eyre!("{}", e))
            })?;
            output.success(format!("Added user '{}'", username));
            Ok(())
        }
        UsersCommands::Remove { username } => {
            modify_state(&path_manager, |state| {
                state
                    .remove_user(&username)
                    .map(|_| ())
                    .ok_or_else(|| unknown_user(&username))
            })?;
            output.success(format!("Removed user '{}'", username));
            Ok(())
        }
        UsersCommands::ResetCursor { username } => {
            modify_state(&path_manager, |state| {
                let user = state.user_mut(&username).ok_or_else(|| unknown_user(&username))?;
                user.reset_cursor();
                Ok(())
            })?;
            output.success(format!("Cursor cleared for '{}'; the next sync scans the full watchlist", username));
            Ok(())
        }
    }
}

fn unknown_user(username: &str) -> color_eyre::Report {
    eyre!("User '{}' is not configured", username)
}

/// Load, change and persist the state under the run lock
fn modify_state<F>(path_manager: &PathManager, change: F) -> Result<()>
where
    F: FnOnce(&mut SyncState) -> Result<()>,
{
    let _lock = RunLock::acquire(path_manager.lock_file())?;
    let store = StateStore::new(path_manager.state_file());
    let mut state = store.load().map_err(|e| eyre!("{:#}", e))?;
    change(&mut state)?;
    store.persist(&state).map_err(|e| eyre!("{:#}", e))
}

fn list_users(path_manager: &PathManager, output: &Output) -> Result<()> {
    let state = StateStore::new(path_manager.state_file())
        .load()
        .map_err(|e| eyre!("{:#}", e))?;

    if !output.is_human() {
        output.data(&json!({ "users": state.users }));
        return Ok(());
    }
    if state.users.is_empty() {
        output.info("No users configured. Add one with `watchsync users add <username>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(
        ["User", "Jellyfin user", "Collection", "Cursor", "Last full sync"]
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );
    for user in &state.users {
        table.add_row(vec![
            user.username.clone(),
            user.jellyfin_username.clone(),
            user.collection_id.clone(),
            user.cursor().unwrap_or("-").to_string(),
            user.last_full_sync
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "never".to_string()),
        ]);
    }
    output.table(table);
    Ok(())
}
