//! Collection curation against the media server.

use anyhow::{Context, Result};
use media_sync_sources::MediaServer;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchAddReport {
    /// Items sent in batches that succeeded
    pub added: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Remove every item the user has played. A failed removal is logged and
/// counted; the rest still run. Listing the collection is the only hard error.
pub async fn remove_watched(server: &dyn MediaServer, user_id: &str, collection_id: &str) -> Result<RemovalReport> {
    let items = server
        .collection_items(user_id, collection_id)
        .await
        .with_context(|| format!("Failed to list collection {}", collection_id))?;

    let mut report = RemovalReport::default();
    for item in items.iter().filter(|i| i.played) {
        match server.remove_from_collection(collection_id, &item.id).await {
            Ok(()) => {
                debug!(collection = collection_id, item = %item.name, "Removed watched movie");
                report.removed += 1;
            }
            Err(e) => {
                warn!(collection = collection_id, item = %item.name, error = %e, "Failed to remove watched movie");
                report.failed += 1;
            }
        }
    }

    if report.removed > 0 || report.failed > 0 {
        info!(collection = collection_id, removed = report.removed, failed = report.failed, "Removed watched movies");
    }
    Ok(report)
}

/// Add ids in chunks of `batch_size`. A failing batch does not stop the next one.
pub async fn add_in_batches(
    server: &dyn MediaServer,
    collection_id: &str,
    ids: &[String],
    batch_size: usize,
) -> BatchAddReport {
    let mut report = BatchAddReport::default();
    for batch in ids.chunks(batch_size.max(1)) {
        report.batches += 1;
        match server.add_to_collection(collection_id, batch).await {
            Ok(()) => report.added += batch.len(),
            Err(e) => {
                warn!(
                    collection = collection_id,
                    batch = report.batches,
                    size = batch.len(),
                    error = %e,
                    "Failed to add batch to collection"
                );
                report.failed_batches += 1;
            }
        }
    }
    if report.batches > 0 {
        info!(collection = collection_id, added = report.added, batches = report.batches, "Updated collection");
    }
    report
}
