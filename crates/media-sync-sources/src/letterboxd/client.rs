use crate::error::SourceError;
use crate::fetch::{FetchClient, FetchRequest};
use crate::letterboxd::parser::{self, WatchlistPage};
use crate::retry::RetryPolicy;
use crate::traits::WatchlistSource;
use async_trait::async_trait;
use media_sync_config::LetterboxdConfig;
use media_sync_models::{ScrapeMode, ScrapeOutcome, StopReason, WatchlistEntry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub base_url: String,
    pub page_size: usize,
    /// Pause after each resolved film page
    pub politeness_delay: Duration,
    pub retry: RetryPolicy,
    pub use_proxy: bool,
}

impl ScraperSettings {
    pub fn from_config(config: &LetterboxdConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            page_size: config.page_size,
            politeness_delay: Duration::from_millis(config.politeness_delay_ms),
            retry: RetryPolicy::from_config(&config.retry),
            use_proxy: config.use_proxy,
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self::from_config(&LetterboxdConfig::default())
    }
}

/// Scrapes public Letterboxd watchlists page by page, resolving every poster
/// to its TMDB id through the film page.
pub struct LetterboxdScraper {
    fetcher: Arc<dyn FetchClient>,
    settings: ScraperSettings,
}

/// Progress of one scrape call
struct ScrapeSession {
    page: u32,
    pages_scanned: u32,
    entries: Vec<WatchlistEntry>,
}

impl ScrapeSession {
    fn new() -> Self {
        Self {
            page: 1,
            pages_scanned: 0,
            entries: Vec::new(),
        }
    }

    fn finish(self, stop_reason: StopReason) -> ScrapeOutcome {
        ScrapeOutcome {
            entries: self.entries,
            stop_reason,
            pages_scanned: self.pages_scanned,
        }
    }
}

impl LetterboxdScraper {
    pub fn new(fetcher: Arc<dyn FetchClient>, settings: ScraperSettings) -> Self {
        Self { fetcher, settings }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn watchlist_page_url(&self, username: &str, page: u32) -> String {
        self.url(&format!("{}/watchlist/page/{}/", urlencoding::encode(username), page))
    }

    async fn fetch_html(&self, url: &str) -> Result<String, SourceError> {
        let request = FetchRequest::get(url).via_proxy(self.settings.use_proxy);
        let response = self.fetcher.fetch(request).await?;
        Ok(response.text()?.to_string())
    }

    async fn fetch_watchlist_page(&self, username: &str, page: u32) -> Result<WatchlistPage, SourceError> {
        let url = self.watchlist_page_url(username, page);
        let url = &url;
        self.settings
            .retry
            .run("watchlist_page", move || async move {
                let html = self.fetch_html(url).await?;
                parser::parse_watchlist_page(&html)
            })
            .await
    }

    /// Only the fetch is retried. A page that loads but carries no id is final.
    async fn resolve_tmdb_id(&self, slug: &str) -> Result<Option<String>, SourceError> {
        let url = self.url(slug);
        let url = &url;
        let html = self
            .settings
            .retry
            .run("film_page", move || async move { self.fetch_html(url).await })
            .await?;
        parser::parse_film_tmdb_id(&html)
    }

    async fn pause(&self) {
        if !self.settings.politeness_delay.is_zero() {
            tokio::time::sleep(self.settings.politeness_delay).await;
        }
    }

    pub async fn scrape(&self, username: &str, mode: &ScrapeMode) -> ScrapeOutcome {
        let stop_at = mode.stop_at();
        let mut session = ScrapeSession::new();
        info!(user = %username, mode = mode.label(), cursor = ?stop_at, "Scraping watchlist");

        loop {
            let page_index = session.page;
            let page = match self.fetch_watchlist_page(username, page_index).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(user = %username, page = page_index, error = %e, "Watchlist page unavailable, stopping scrape");
                    return session.finish(StopReason::FetchFailed { page: page_index });
                }
            };
            session.pages_scanned += 1;
            debug!(user = %username, page = page_index, posters = page.poster_count, "Fetched watchlist page");

            let is_last = page.is_last(self.settings.page_size);
            for slug in page.film_slugs {
                match self.resolve_tmdb_id(&slug).await {
                    Ok(Some(tmdb_id)) => {
                        if stop_at == Some(tmdb_id.as_str()) {
                            info!(
                                user = %username,
                                page = page_index,
                                new_entries = session.entries.len(),
                                "Reached previously synced entry"
                            );
                            return session.finish(StopReason::CursorReached);
                        }
                        debug!(slug = %slug, tmdb_id = %tmdb_id, "Resolved film");
                        session.entries.push(WatchlistEntry::new(tmdb_id, slug));
                        self.pause().await;
                    }
                    Ok(None) => {
                        warn!(slug = %slug, "Film page has no TMDB id, skipping");
                    }
                    Err(e) => {
                        warn!(slug = %slug, error = %e, "Failed to resolve film, skipping");
                    }
                }
            }

            if is_last {
                info!(
                    user = %username,
                    pages = session.pages_scanned,
                    entries = session.entries.len(),
                    "Reached end of watchlist"
                );
                return session.finish(StopReason::ShortPage);
            }
            session.page += 1;
        }
    }
}

#[async_trait]
impl WatchlistSource for LetterboxdScraper {
    fn source_name(&self) -> &str {
        "letterboxd"
    }

    async fn scrape_watchlist(&self, username: &str, mode: &ScrapeMode) -> ScrapeOutcome {
        self.scrape(username, mode).await
    }
}
