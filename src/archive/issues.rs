//! Issue discovery from the volume index pages.
//!
//! Each volume's index page (`<base>/V<vol>/`) links to its issues with anchors
//! whose text contains `Issue`. Volumes are walked oldest to newest and issues
//! keep the order they appear in on the index page.

use std::ops::RangeInclusive;

use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::Harvested;
use super::links::IssueLinkResolver;
use crate::errors::SkipReason;
use crate::fetcher::{Fetcher, PageSource};
use crate::models::{IssueRef, VolumeRef};
use crate::shutdown::Shutdown;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("static selector"));

const ISSUE_MARKER: &str = "Issue";

/// Collect the issue URLs linked from one volume index page.
pub fn issue_links(
    document: &Html,
    base_url: &Url,
    volume_url: &Url,
    resolver: &dyn IssueLinkResolver,
) -> Harvested<IssueRef> {
    let mut harvested = Harvested::default();
    for anchor in document.select(&ANCHOR) {
        let text = anchor.text().collect::<String>();
        if !text.contains(ISSUE_MARKER) {
            continue;
        }
        match resolver.issue_url(anchor, base_url, volume_url) {
            Ok(url) => harvested.items.push(IssueRef(url)),
            Err(reason) => {
                warn!(volume = %volume_url, category = reason.category(), %reason, "Skipping issue link");
                harvested.skipped.push(reason);
            }
        }
    }
    harvested
}

/// Fetch one volume index page and collect its issues.
#[instrument(level = "debug", skip(fetcher, resolver))]
async fn volume_issues<S: PageSource>(
    fetcher: &Fetcher<S>,
    base_url: &Url,
    volume: VolumeRef,
    resolver: &dyn IssueLinkResolver,
) -> Harvested<IssueRef> {
    let index_url = volume.index_url(base_url.as_str());
    let parsed = match Url::parse(&index_url) {
        Ok(u) => u,
        Err(e) => {
            return Harvested::skipped(SkipReason::BadLink {
                href: index_url,
                reason: e.to_string(),
            });
        }
    };

    let Some(document) = fetcher.fetch(&index_url).await else {
        let reason = SkipReason::VolumeFetch { url: index_url };
        debug!(category = reason.category(), %reason, "Volume contributes no issues");
        return Harvested::skipped(reason);
    };

    let harvested = issue_links(&document, base_url, &parsed, resolver);
    debug!(volume = volume.0, count = harvested.items.len(), "Indexed volume");
    harvested
}

/// Walk every volume in `volumes` and collect issue URLs in archive order.
///
/// Up to `concurrency` index pages are fetched at once; results are buffered
/// back into volume order. No new volume is started once `shutdown` fires.
#[instrument(level = "info", skip_all, fields(first = *volumes.start(), last = *volumes.end()))]
pub async fn discover_issues<S: PageSource>(
    fetcher: &Fetcher<S>,
    base_url: &Url,
    volumes: RangeInclusive<u32>,
    resolver: &dyn IssueLinkResolver,
    concurrency: usize,
    shutdown: &Shutdown,
) -> Harvested<IssueRef> {
    let per_volume: Vec<Harvested<IssueRef>> = stream::iter(volumes.map(VolumeRef))
        .take_while(|_| std::future::ready(!shutdown.is_triggered()))
        .map(|volume| volume_issues(fetcher, base_url, volume, resolver))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let harvested: Harvested<IssueRef> = per_volume.into_iter().collect();
    info!(
        issues = harvested.items.len(),
        skipped = harvested.skipped.len(),
        "Discovered archive issues"
    );
    harvested
}
