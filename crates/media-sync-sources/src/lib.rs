pub mod error;
pub mod fetch;
pub mod html;
pub mod jellyfin;
pub mod letterboxd;
pub mod radarr;
pub mod retry;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::SourceError;
pub use fetch::{FetchClient, FetchRequest, FetchResponse, HttpFetcher, ProxySettings};
pub use jellyfin::JellyfinClient;
pub use letterboxd::{LetterboxdScraper, ScraperSettings};
pub use radarr::RadarrClient;
pub use retry::{Backoff, RetryPolicy};
pub use traits::{AcquisitionService, MediaServer, WatchlistSource};
