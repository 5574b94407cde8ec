use thiserror::Error;

/// Failure of a single request through the fetch gateway
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("invalid request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },

    #[error("proxy setup failed: {0}")]
    Proxy(String),

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned status {status}, expected one of {expected:?}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        expected: Vec<u16>,
    },

    #[error("failed to read body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("invalid selector `{css}`: {reason}")]
    Selector { css: String, reason: String },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl SourceError {
    /// Short label used to group failures in progress summaries
    pub fn category(&self) -> &'static str {
        match self {
            SourceError::InvalidRequest { .. } => "invalid_request",
            SourceError::Proxy(_) => "proxy",
            SourceError::Transport { .. } => "transport",
            SourceError::UnexpectedStatus { .. } => "status",
            SourceError::Body { .. } => "body",
            SourceError::Selector { .. } => "selector",
            SourceError::Decode { .. } => "decode",
        }
    }

    pub fn decode(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SourceError::Decode {
            url: url.into(),
            reason: err.to_string(),
        }
    }
}
