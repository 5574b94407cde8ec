use crate::commands::sync::{execute_sync, report};
use crate::commands::{load_config, load_env};
use crate::output::Output;
use color_eyre::Result;
use media_sync_config::{default_scheduler_config, Config, PathManager};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

pub struct Scheduler {
    config: Config,
    path_manager: PathManager,
    interval: Duration,
    run_on_startup: bool,
}

impl Scheduler {
    pub fn new(config: Config, path_manager: PathManager, interval_override: Option<u64>, no_startup_sync: bool) -> Self {
        let scheduler_config = config.scheduler.clone().unwrap_or_else(default_scheduler_config);
        let minutes = interval_override.unwrap_or(scheduler_config.interval_minutes).max(1);
        Self {
            config,
            path_manager,
            interval: Duration::from_secs(minutes * 60),
            run_on_startup: scheduler_config.run_on_startup && !no_startup_sync,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs until Ctrl-C. A pass in progress finishes before shutdown.
    pub async fn start(&self, output: &Output) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.run_on_startup {
            // The first tick completes immediately
            ticker.tick().await;
        }

        info!(
            operation = "scheduler_started",
            interval_secs = self.interval.as_secs(),
            run_on_startup = self.run_on_startup,
            "Scheduler started"
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_pass(output).await,
                _ = &mut shutdown => {
                    info!(operation = "scheduler_stopped", "Shutdown requested, stopping scheduler");
                    return Ok(());
                }
            }
        }
    }

    async fn run_pass(&self, output: &Output) {
        info!(operation = "scheduled_sync_start", "Starting scheduled sync");
        match execute_sync(&self.config, &self.path_manager, false, None).await {
            Ok(result) => {
                info!(
                    operation = "scheduled_sync_complete",
                    users = result.users.len(),
                    items_added = result.items_added(),
                    errors = result.error_count(),
                    duration_ms = result.duration.as_millis() as u64,
                    "Scheduled sync completed"
                );
                report(&result, output);
            }
            Err(e) => {
                // Failed passes (including lock contention) wait for the next tick
                error!(operation = "scheduled_sync_error", error = %e, "Scheduled sync failed");
                output.error(format!("Sync failed: {}", e));
            }
        }
    }
}

pub async fn run_daemon(interval_minutes: Option<u64>, no_startup_sync: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    load_env(&path_manager);
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create directories: {}", e))?;
    let config = load_config(&path_manager)?;

    let scheduler = Scheduler::new(config, path_manager, interval_minutes, no_startup_sync);
    output.info(format!(
        "Daemon running, syncing every {} minute(s). Press Ctrl-C to stop.",
        scheduler.interval().as_secs() / 60
    ));
    scheduler.start(output).await
}
