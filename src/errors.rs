//! Error taxonomy for the harvester.
//!
//! Only [`ConfigError`] is ever fatal. [`FetchError`] describes a single failed
//! GET and [`SkipReason`] records a unit of work (a volume, an issue, an anchor
//! or an article) that was dropped so the run could carry on.

use std::io;

use thiserror::Error;

/// Setup failures reported before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("keyword set is empty")]
    EmptyKeywords,
    #[error("invalid volume range {first}..={last}")]
    InvalidVolumeRange { first: u32, last: u32 },
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("could not read config file '{path}': {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config file '{path}': {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("output path '{path}' is not writable: {source}")]
    Output {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// A single failed GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}")]
    Status { status: u16 },
    #[error("no such page")]
    NotFound,
}

/// Why a unit of work was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("volume index could not be fetched: {url}")]
    VolumeFetch { url: String },
    #[error("issue page could not be fetched: {url}")]
    IssueFetch { url: String },
    #[error("issue page has no main container: {url}")]
    MissingMain { url: String },
    #[error("anchor has no link target: {anchor}")]
    MissingHref { anchor: String },
    #[error("link '{href}' could not be resolved: {reason}")]
    BadLink { href: String, reason: String },
    #[error("article could not be fetched: {url}")]
    ArticleFetch { url: String },
    #[error("article has no main container: {url}")]
    ArticleMissingMain { url: String },
}

impl SkipReason {
    /// The diagnostic category printed next to the failing URL.
    pub fn category(&self) -> &'static str {
        match self {
            SkipReason::VolumeFetch { .. } => "volume-index failure",
            SkipReason::IssueFetch { .. } | SkipReason::MissingMain { .. } => {
                "issue-souping failure"
            }
            SkipReason::MissingHref { .. } | SkipReason::BadLink { .. } => {
                "headline-append failure"
            }
            SkipReason::ArticleFetch { .. } | SkipReason::ArticleMissingMain { .. } => {
                "article-fetch failure"
            }
        }
    }
}
