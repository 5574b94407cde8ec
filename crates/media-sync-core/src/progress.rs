use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome counters of a batch operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressCounts {
    pub added: usize,
    pub already_present: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Tracks a multi-item operation and logs periodic progress plus one summary,
/// instead of a line per item.
pub struct ProgressTracker {
    total: usize,
    counts: ProgressCounts,
    start_time: Instant,
    /// Log every N items
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 {
            info!("Starting operation: {} items to process", total);
        }
        Self {
            total,
            counts: ProgressCounts::default(),
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record_added(&mut self) {
        self.counts.added += 1;
    }

    pub fn record_already_present(&mut self) {
        self.counts.already_present += 1;
    }

    /// Failure grouped under `error_category` in the summary
    pub fn record_failed_with_error(&mut self, error_category: &str) {
        self.counts.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    pub fn record_skipped(&mut self) {
        self.counts.skipped += 1;
    }

    pub fn counts(&self) -> ProgressCounts {
        self.counts
    }

    /// `current` is 1-based
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log < self.progress_interval && current != self.total {
            return;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        // Fast runs produce noise, not information
        if elapsed < 0.5 && current < self.total {
            return;
        }
        info!(
            "Progress: {}/{} | Added: {} | Present: {} | Failed: {} | Skipped: {}",
            current, self.total, self.counts.added, self.counts.already_present, self.counts.failed, self.counts.skipped
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let c = self.counts;
        if c.failed == 0 {
            info!(
                "{} completed: {} total in {:.1}s | Added: {} | Already present: {} | Skipped: {}",
                operation_name, self.total, elapsed, c.added, c.already_present, c.skipped
            );
            return;
        }

        warn!(
            "{} completed: {} total in {:.1}s | Added: {} | Already present: {} | Failed: {} | Skipped: {}",
            operation_name, self.total, elapsed, c.added, c.already_present, c.failed, c.skipped
        );
        let mut breakdown: Vec<_> = self.error_counts.iter().collect();
        breakdown.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let summary: Vec<String> = breakdown.iter().map(|(category, count)| format!("{}: {}", category, count)).collect();
        info!("Error breakdown: {}", summary.join(", "));
    }
}
