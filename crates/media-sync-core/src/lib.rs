pub mod acquisition;
pub mod collection;
pub mod progress;
pub mod resolution;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use acquisition::{acquire_all, ensure_acquired, resolve_acquisition_state, AcquisitionReport, AcquisitionSettings};
pub use collection::{add_in_batches, remove_watched, BatchAddReport, RemovalReport};
pub use progress::{ProgressCounts, ProgressTracker};
pub use resolution::{resolve_library_ids, LibraryIndex, LibraryResolution};
pub use sync::{CurationReport, SyncOptions, SyncOrchestrator, SyncResult, UserSyncReport};
