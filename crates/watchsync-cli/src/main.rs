use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, daemon, sync, users};
use media_sync_config::PathManager;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchsync")]
#[command(about = "Watchsync - Turn Letterboxd watchlists into Radarr downloads and Jellyfin collections")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass for every configured user
    #[command(long_about = "Scrape each user's watchlist (incrementally, or in full when the full-sync interval has elapsed), request new films from Radarr, drop watched items from the user's Jellyfin collection and add newly available ones.")]
    Sync {
        /// Rescan the whole watchlist, ignoring the saved cursor
        #[arg(long, action = ArgAction::SetTrue)]
        force_full_sync: bool,

        /// Only sync this user
        #[arg(long, value_name = "USERNAME")]
        user: Option<String>,
    },
    /// Run sync passes on a fixed interval
    #[command(long_about = "Run Watchsync as a long-lived process that performs a sync pass every interval. The first pass runs immediately unless --no-startup-sync is given. Ctrl-C stops the loop between passes.")]
    Daemon {
        /// Minutes between passes (overrides [scheduler].interval_minutes)
        #[arg(long, value_name = "MINUTES")]
        interval_minutes: Option<u64>,

        /// Skip the sync pass on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Write logs to a daily-rotated file in the log directory instead of stderr
        #[arg(long, action = ArgAction::SetTrue)]
        log_file: bool,
    },
    /// Manage synced users
    Users {
        #[command(subcommand)]
        cmd: UsersCommands,
    },
    /// Configure settings and credentials
    #[command(long_about = "Manage the configuration file and stored API keys. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear stored state, locks or credentials
    Clear {
        /// Clear state and credentials, and release the run lock
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Delete sync state (all users and cursors)
        #[arg(long, action = ArgAction::SetTrue)]
        state: bool,

        /// Release a run lock left behind by a crashed process
        #[arg(long, action = ArgAction::SetTrue)]
        lock: bool,

        /// Delete stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users with their cursor and last full sync
    List,
    /// Add a user to sync
    Add {
        /// Letterboxd username
        username: String,

        /// Jellyfin collection to curate (if not provided, will prompt)
        #[arg(long)]
        collection_id: Option<String>,

        /// Jellyfin account name (defaults to the Letterboxd username)
        #[arg(long)]
        jellyfin_user: Option<String>,
    },
    /// Stop syncing a user
    Remove { username: String },
    /// Forget a user's cursor so the next run scans the full watchlist
    ResetCursor { username: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (API keys are masked)
    Show,
    /// Write a configuration template
    Init {
        /// Overwrite an existing configuration file without asking
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Store Radarr and Jellyfin API keys and proxy credentials
    #[command(long_about = "Store API keys and proxy credentials in the credentials file. Values not given as flags are prompted for; an empty answer leaves the stored value unchanged. Environment variables (RADARR_API_KEY, JELLYFIN_API_KEY, PROXY_URL, PROXY_USER, PROXY_PASS) override stored values at run time.")]
    Credentials {
        #[arg(long)]
        radarr_api_key: Option<String>,

        #[arg(long)]
        jellyfin_api_key: Option<String>,

        #[arg(long)]
        proxy_user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Daemon { log_file: true, .. } => Some(PathManager::default().daemon_log_file()),
        _ => None,
    };
    logging::init_logging(cli.verbose, cli.quiet, log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { force_full_sync, user } => sync::run_sync(force_full_sync, user, &output).await,
        Commands::Daemon {
            interval_minutes,
            no_startup_sync,
            ..
        } => daemon::run_daemon(interval_minutes, no_startup_sync, &output).await,
        Commands::Users { cmd } => users::run_users(cmd, &output),
        Commands::Config { cmd } => config::run_config(cmd.unwrap_or(ConfigCommands::Show), &output),
        Commands::Clear {
            all,
            state,
            lock,
            credentials,
        } => clear::run_clear(all, state, lock, credentials, &output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_flags() {
        let cli = Cli::try_parse_from(["watchsync", "sync", "--force-full-sync", "--user", "alice", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Sync { force_full_sync, user } => {
                assert!(force_full_sync);
                assert_eq!(user.as_deref(), Some("alice"));
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_parse_users_add() {
        let cli = Cli::try_parse_from(["watchsync", "users", "add", "bob", "--collection-id", "abc"]).unwrap();
        match cli.command {
            Commands::Users {
                cmd:
                    UsersCommands::Add {
                        username,
                        collection_id,
                        jellyfin_user,
                    },
            } => {
                assert_eq!(username, "bob");
                assert_eq!(collection_id.as_deref(), Some("abc"));
                assert!(jellyfin_user.is_none());
            }
            _ => panic!("expected users add"),
        }
    }
}
