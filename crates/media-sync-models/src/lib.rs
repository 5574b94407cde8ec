pub mod acquisition;
pub mod media;
pub mod sync_mode;
pub mod user_state;
pub mod watchlist;

pub use acquisition::{AcquisitionOutcome, AcquisitionRecord, AcquisitionRequest, MovieCategory};
pub use media::{CollectionItem, LibraryItem, MediaServerUser};
pub use sync_mode::ScrapeMode;
pub use user_state::UserSyncState;
pub use watchlist::{ScrapeOutcome, StopReason, WatchlistEntry};
