use serde::{Deserialize, Serialize};

/// How far a watchlist scrape walks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScrapeMode {
    /// Walk every page until a short page, collecting everything.
    Full,
    /// Stop as soon as the cursor identifier is met. An empty cursor walks
    /// the whole list, like `Full`.
    Incremental { cursor: String },
}

impl ScrapeMode {
    pub fn incremental(cursor: impl Into<String>) -> Self {
        ScrapeMode::Incremental {
            cursor: cursor.into(),
        }
    }

    /// The identifier that ends the scrape, if any
    pub fn stop_at(&self) -> Option<&str> {
        match self {
            ScrapeMode::Full => None,
            ScrapeMode::Incremental { cursor } if cursor.is_empty() => None,
            ScrapeMode::Incremental { cursor } => Some(cursor.as_str()),
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, ScrapeMode::Full)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScrapeMode::Full => "full",
            ScrapeMode::Incremental { .. } => "incremental",
        }
    }
}
