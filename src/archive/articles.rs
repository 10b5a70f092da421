//! Article extraction from an issue page.
//!
//! The articles of an issue live under the element with `id="main"`. Each
//! direct child of that container holding at least four anchors is a dated
//! block:
//!
//! ```text
//! anchor 0     issue label           (ignored)
//! anchor 1     "<label>: <date>"     -> publication date of the block
//! anchor 2     navigation            (ignored)
//! anchor 3..   article headlines     -> one ArticleRecord each
//! ```
//!
//! Children with fewer anchors are navigation chrome and are skipped.

use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::Harvested;
use super::links::{is_author_link, resolve_article_url};
use crate::errors::SkipReason;
use crate::fetcher::{Fetcher, PageSource};
use crate::models::{ArticleRecord, IssueRef};
use crate::shutdown::Shutdown;
use crate::utils::truncate_for_log;

pub(crate) static MAIN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#main").expect("static selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("static selector"));

const MIN_BLOCK_ANCHORS: usize = 4;
const DATE_ANCHOR: usize = 1;
const FIRST_ARTICLE_ANCHOR: usize = 3;
const ANCHOR_LOG_LIMIT: usize = 200;

/// Visible text of an element with runs of whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .join(" ")
}

/// The date part of a block's date anchor.
///
/// Everything up to and including the first colon is dropped. When nothing
/// follows the colon the text before it is the date.
pub fn publication_date(label: &str) -> String {
    match label.split_once(':') {
        Some((head, tail)) => {
            let tail = tail.trim();
            if tail.is_empty() {
                head.trim().to_string()
            } else {
                tail.to_string()
            }
        }
        None => label.trim().to_string(),
    }
}

/// Parse an issue page into article records.
///
/// Fails only when the page has no main container; a bad anchor drops that
/// anchor alone.
pub fn parse_issue(
    document: &Html,
    base_url: &Url,
    issue_url: &Url,
) -> Result<Harvested<ArticleRecord>, SkipReason> {
    let main = document
        .select(&MAIN)
        .next()
        .ok_or_else(|| SkipReason::MissingMain {
            url: issue_url.to_string(),
        })?;

    let mut harvested = Harvested::default();
    for block in main.children().filter_map(ElementRef::wrap) {
        let anchors = block.select(&ANCHOR).collect::<Vec<_>>();
        if anchors.len() < MIN_BLOCK_ANCHORS {
            continue;
        }

        let date = publication_date(&element_text(anchors[DATE_ANCHOR]));
        for anchor in &anchors[FIRST_ARTICLE_ANCHOR..] {
            let Some(href) = anchor.value().attr("href") else {
                let reason = SkipReason::MissingHref {
                    anchor: truncate_for_log(&anchor.html(), ANCHOR_LOG_LIMIT),
                };
                warn!(issue = %issue_url, category = reason.category(), %reason, "Headline append failed");
                harvested.skipped.push(reason);
                continue;
            };
            if is_author_link(href) {
                debug!(%href, "Skipping byline link");
                continue;
            }
            match resolve_article_url(base_url, issue_url, href) {
                Ok(url) => harvested.items.push(ArticleRecord {
                    headline: element_text(*anchor),
                    url: url.to_string(),
                    publication_date: date.clone(),
                }),
                Err(reason) => {
                    warn!(issue = %issue_url, category = reason.category(), %reason, "Headline append failed");
                    harvested.skipped.push(reason);
                }
            }
        }
    }
    Ok(harvested)
}

/// Fetch one issue page and extract its articles.
///
/// A fetch failure or a page without a main container yields no records and a
/// single skip reason naming the issue.
#[instrument(level = "debug", skip_all, fields(issue = %issue.as_str()))]
pub async fn extract_articles<S: PageSource>(
    fetcher: &Fetcher<S>,
    base_url: &Url,
    issue: &IssueRef,
) -> Harvested<ArticleRecord> {
    let issue_url = match Url::parse(issue.as_str()) {
        Ok(u) => u,
        Err(e) => {
            return Harvested::skipped(SkipReason::BadLink {
                href: issue.0.clone(),
                reason: e.to_string(),
            });
        }
    };

    let Some(document) = fetcher.fetch(issue.as_str()).await else {
        let reason = SkipReason::IssueFetch {
            url: issue.0.clone(),
        };
        warn!(category = reason.category(), %reason, "Issue souping failed");
        return Harvested::skipped(reason);
    };

    match parse_issue(&document, base_url, &issue_url) {
        Ok(harvested) => {
            debug!(count = harvested.items.len(), "Extracted issue articles");
            harvested
        }
        Err(reason) => {
            warn!(category = reason.category(), %reason, "Issue souping failed");
            Harvested::skipped(reason)
        }
    }
}

/// Extract the articles of every issue, keeping issue order.
///
/// Up to `concurrency` issue pages are in flight at once. No new issue is
/// started once `shutdown` fires.
#[instrument(level = "info", skip_all, fields(issues = issues.len()))]
pub async fn extract_all<S: PageSource>(
    fetcher: &Fetcher<S>,
    base_url: &Url,
    issues: &[IssueRef],
    concurrency: usize,
    shutdown: &Shutdown,
) -> Harvested<ArticleRecord> {
    let per_issue: Vec<Harvested<ArticleRecord>> = stream::iter(issues)
        .take_while(|_| std::future::ready(!shutdown.is_triggered()))
        .map(|issue| extract_articles(fetcher, base_url, issue))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let harvested: Harvested<ArticleRecord> = per_issue.into_iter().collect();
    info!(
        headlines = harvested.items.len(),
        skipped = harvested.skipped.len(),
        "Collected headlines from all issues"
    );
    harvested
}
