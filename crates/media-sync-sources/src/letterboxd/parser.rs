use crate::error::SourceError;
use crate::html::{attribute, select, select_first, HtmlSelector};
use scraper::Html;

/// Posters on a full watchlist page
pub const FULL_PAGE_SIZE: usize = 28;

pub const POSTER_CLASS: &str = "really-lazy-load poster film-poster";
pub const TARGET_LINK_ATTR: &str = "data-target-link";
pub const FILM_BODY_CLASS: &str = "film";
pub const TMDB_ID_ATTR: &str = "data-tmdb-id";

/// What one watchlist page yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistPage {
    /// Every poster on the page, including those without a link.
    /// Compared against the page size to detect the last page.
    pub poster_count: usize,
    /// Film page paths in page order, e.g. `film/heat-1995/`
    pub film_slugs: Vec<String>,
}

impl WatchlistPage {
    pub fn is_last(&self, page_size: usize) -> bool {
        self.poster_count < page_size
    }
}

pub fn parse_watchlist_page(html: &str) -> Result<WatchlistPage, SourceError> {
    let document = Html::parse_document(html);
    let selector = HtmlSelector::tag("div").with_class(POSTER_CLASS).multiple();
    let posters = select(&document, &selector)?;

    let film_slugs = posters
        .iter()
        .filter_map(|poster| attribute(poster, TARGET_LINK_ATTR))
        .filter_map(slug_from_target_link)
        .collect();

    Ok(WatchlistPage {
        poster_count: posters.len(),
        film_slugs,
    })
}

/// `/film/heat-1995/` -> `film/heat-1995/`
pub fn slug_from_target_link(link: &str) -> Option<String> {
    let slug = link.trim().strip_prefix('/').unwrap_or(link.trim());
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// TMDB id advertised on a film page. `None` when the page has no film body
/// or the attribute is missing or empty.
pub fn parse_film_tmdb_id(html: &str) -> Result<Option<String>, SourceError> {
    let document = Html::parse_document(html);
    let body = select_first(&document, &HtmlSelector::tag("body").with_class(FILM_BODY_CLASS))?;

    Ok(body
        .and_then(|b| attribute(&b, TMDB_ID_ATTR))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string))
}

#[cfg(test)]
mod tests;
