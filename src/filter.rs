//! Keyword filtering of harvested records.
//!
//! Two granularities are supported:
//!
//! | Mode | Text tested | Network |
//! |------|-------------|---------|
//! | [`FilterMode::Headline`] | the record's headline | none |
//! | [`FilterMode::FullArticle`] | text of the article's main container | one fetch per record |
//!
//! Text is split on `\w+` runs and lowercased; a record matches when any token
//! equals a keyword (or a keyword phrase occurs as consecutive tokens). Tokens
//! are compared whole, so `deadline` never matches `dead`.

use clap::ValueEnum;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::archive::Harvested;
use crate::archive::articles::MAIN;
use crate::errors::SkipReason;
use crate::fetcher::{Fetcher, PageSource};
use crate::models::{ArticleRecord, KeywordSet};
use crate::shutdown::Shutdown;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static regex"));

/// Extensions that point at images rather than article pages.
const IMAGE_EXTENSIONS: [&str; 4] = [".gif", ".jpg", ".jpeg", ".png"];

/// Which text a record is matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Match on the headline text only.
    #[default]
    Headline,
    /// Fetch every article and match on its body.
    FullArticle,
}

/// Lowercase word tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Headline-mode predicate.
pub fn headline_matches(keywords: &KeywordSet, record: &ArticleRecord) -> bool {
    keywords.matches_tokens(&tokenize(&record.headline))
}

/// True for links to images, which are never fetched.
pub fn is_image_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Match the text of an article's main container. `None` when the page has
/// no main container.
pub fn article_document_matches(keywords: &KeywordSet, document: &Html) -> Option<bool> {
    let main = document.select(&MAIN).next()?;
    let text = main.text().collect::<Vec<_>>().join(" ");
    Some(keywords.matches_tokens(&tokenize(&text)))
}

/// Applies the configured [`FilterMode`] to records.
#[derive(Debug)]
pub struct KeywordFilter<'a, S> {
    fetcher: &'a Fetcher<S>,
    keywords: &'a KeywordSet,
    mode: FilterMode,
}

impl<'a, S: PageSource> KeywordFilter<'a, S> {
    pub fn new(fetcher: &'a Fetcher<S>, keywords: &'a KeywordSet, mode: FilterMode) -> Self {
        Self {
            fetcher,
            keywords,
            mode,
        }
    }

    /// Test one record. An article that cannot be fetched or has no main
    /// container does not match and comes back as the reason.
    pub async fn matches(&self, record: &ArticleRecord) -> Result<bool, SkipReason> {
        match self.mode {
            FilterMode::Headline => Ok(headline_matches(self.keywords, record)),
            FilterMode::FullArticle => {
                if is_image_url(&record.url) {
                    debug!(url = %record.url, "Skipping image link");
                    return Ok(false);
                }
                let Some(document) = self.fetcher.fetch(&record.url).await else {
                    return Err(SkipReason::ArticleFetch {
                        url: record.url.clone(),
                    });
                };
                article_document_matches(self.keywords, &document).ok_or_else(|| {
                    SkipReason::ArticleMissingMain {
                        url: record.url.clone(),
                    }
                })
            }
        }
    }

    /// Keep the matching records in their original order.
    ///
    /// In full-article mode up to `concurrency` articles are fetched at once,
    /// and no new article is fetched once `shutdown` fires; records not yet
    /// tested by then are dropped. Headline mode needs no requests, so every
    /// record already harvested is tested even after cancellation.
    #[instrument(level = "info", skip_all, fields(mode = ?self.mode, records = records.len()))]
    pub async fn filter_records(
        &self,
        records: Vec<ArticleRecord>,
        concurrency: usize,
        shutdown: &Shutdown,
    ) -> Harvested<ArticleRecord> {
        info!(
            records = records.len(),
            keywords = %self.keywords,
            "Filtering headlines against keywords"
        );

        let offline = self.mode == FilterMode::Headline;
        let outcomes: Vec<(ArticleRecord, Result<bool, SkipReason>)> = stream::iter(records)
            .take_while(|_| std::future::ready(offline || !shutdown.is_triggered()))
            .map(|record| async move {
                let outcome = self.matches(&record).await;
                (record, outcome)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut harvested = Harvested::default();
        for (record, outcome) in outcomes {
            match outcome {
                Ok(true) => harvested.items.push(record),
                Ok(false) => {}
                Err(reason) => {
                    warn!(category = reason.category(), %reason, "Article dropped from filter");
                    harvested.skipped.push(reason);
                }
            }
        }

        info!(matched = harvested.items.len(), "Finished filtering");
        harvested
    }
}
