use thiserror::Error;

use crate::config::ConfigError;
use crate::fetcher::FetchError;

/// Errors that stop a harvest request before any fetching happens.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("no site configuration found for '{site}'")]
    UnknownSite { site: String },

    #[error("site '{site}' has no language URIs configured")]
    NoLanguageUris { site: String },

    #[error("site '{site}' has an invalid selector '{selector}': {reason}")]
    InvalidSelector {
        site: String,
        selector: String,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport setup failed: {0}")]
    Transport(#[from] FetchError),
}

impl ScrapeError {
    /// The site the error is about, when there is one.
    pub fn site(&self) -> Option<&str> {
        match self {
            Self::UnknownSite { site }
            | Self::NoLanguageUris { site }
            | Self::InvalidSelector { site, .. } => Some(site),
            Self::Config(_) | Self::Transport(_) => None,
        }
    }
}

/// One page that could not be fetched. The rest of the harvest carries on.
#[derive(Error, Debug)]
#[error("error crawling site '{site}' ({language}) at {uri}: {source}")]
pub struct TaskError {
    pub site: String,
    pub language: String,
    pub uri: String,
    #[source]
    pub source: FetchError,
}

impl TaskError {
    pub fn is_retryable(&self) -> bool {
        self.source.should_retry()
    }
}
