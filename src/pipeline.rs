//! The harvest pipeline.
//!
//! ```text
//! volumes ──discover──▶ issues ──extract──▶ records ──filter──▶ matches
//! ```
//!
//! Each stage keeps discovery order and hands its dropped units forward as
//! [`SkipReason`]s, so the report carries both the surviving records and a
//! full account of what was lost.

use std::collections::BTreeMap;
use std::time::Instant;

use itertools::Itertools;
use tracing::{info, instrument};

use crate::archive::articles::extract_all;
use crate::archive::issues::discover_issues;
use crate::archive::links::{HrefResolver, IssueLinkResolver, LegacyOffsetResolver};
use crate::config::{IssueLinkStyle, Settings};
use crate::errors::SkipReason;
use crate::fetcher::{Fetcher, PageSource};
use crate::filter::KeywordFilter;
use crate::models::ArticleRecord;
use crate::shutdown::Shutdown;

/// Outcome of one run.
#[derive(Debug)]
pub struct HarvestReport {
    /// Issue pages discovered.
    pub issues: usize,
    /// Records extracted before filtering.
    pub records_total: usize,
    /// Records to write: the matches, or everything for discovery-only runs.
    pub records: Vec<ArticleRecord>,
    /// Every unit dropped along the way, in the order it was dropped.
    pub diagnostics: Vec<SkipReason>,
    /// True when the run stopped early on Ctrl+C.
    pub cancelled: bool,
}

impl HarvestReport {
    /// Number of diagnostics per failure category.
    pub fn diagnostic_counts(&self) -> BTreeMap<&'static str, usize> {
        self.diagnostics
            .iter()
            .map(SkipReason::category)
            .counts()
            .into_iter()
            .collect()
    }
}

/// Runs discovery, extraction and filtering over the archive.
#[derive(Debug)]
pub struct Harvester<S> {
    fetcher: Fetcher<S>,
    settings: Settings,
    shutdown: Shutdown,
}

impl<S: PageSource> Harvester<S> {
    pub fn new(source: S, settings: Settings, shutdown: Shutdown) -> Self {
        Self {
            fetcher: Fetcher::new(source),
            settings,
            shutdown,
        }
    }

    fn issue_resolver(&self) -> &'static dyn IssueLinkResolver {
        match self.settings.issue_links {
            IssueLinkStyle::Attribute => &HrefResolver,
            IssueLinkStyle::Legacy => &LegacyOffsetResolver,
        }
    }

    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> HarvestReport {
        let t0 = Instant::now();
        let settings = &self.settings;

        let discovered = discover_issues(
            &self.fetcher,
            &settings.base_url,
            settings.volumes.clone(),
            self.issue_resolver(),
            settings.concurrency,
            &self.shutdown,
        )
        .await;
        let mut diagnostics = discovered.skipped;

        let extracted = extract_all(
            &self.fetcher,
            &settings.base_url,
            &discovered.items,
            settings.concurrency,
            &self.shutdown,
        )
        .await;
        diagnostics.extend(extracted.skipped);
        let records_total = extracted.items.len();
        info!(
            headlines = records_total,
            "Finished collecting headlines from the archive"
        );

        let records = if settings.discover_only {
            extracted.items
        } else {
            let filter = KeywordFilter::new(&self.fetcher, &settings.keywords, settings.mode);
            let filtered = filter
                .filter_records(extracted.items, settings.concurrency, &self.shutdown)
                .await;
            diagnostics.extend(filtered.skipped);
            filtered.items
        };

        let report = HarvestReport {
            issues: discovered.items.len(),
            records_total,
            records,
            diagnostics,
            cancelled: self.shutdown.is_triggered(),
        };
        info!(
            issues = report.issues,
            headlines = report.records_total,
            kept = report.records.len(),
            skipped = report.diagnostics.len(),
            cancelled = report.cancelled,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Harvest complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use crate::fetcher::testing::StaticSite;
    use crate::filter::FilterMode;
    use crate::outputs::tabular::{HeaderStyle, write_records};

    const VOLUME_109: &str = r#"<html><body>
        <a href="/">The Tech</a>
        <a href="/V109/N1/">Issue 1</a>
        <a href="/V109/N2/">Issue 2</a>
        </body></html>"#;

    const ISSUE_1: &str = r#"<html><body><div id="main">
        <div>
          <a href="/V109/N1/">Issue N1</a>
          <a href="/V109/N1/">Jan 1, 1990: </a>
          <a href="/">Home</a>
          <a>Next</a>
          <a href="/V109/N1/a.html">Man dies in accident</a>
          <a href="/V109/N1/b.html">Local election results</a>
        </div>
        </div></body></html>"#;

    const ISSUE_2: &str = r#"<html><body><div id="main">
        <div>
          <a href="/V109/N2/">Issue N2</a>
          <a href="/V109/N2/">Date: Jan 5, 1990</a>
          <a href="/">Home</a>
          <a href="photo.jpg">Photo: campus in snow</a>
          <a href="deadline.html">Deadline extended for suicide prevention grant</a>
        </div>
        </div></body></html>"#;

    fn archive() -> StaticSite {
        StaticSite::new()
            .page("http://tech.mit.edu/V109/", VOLUME_109)
            .page("http://tech.mit.edu/V109/N1/", ISSUE_1)
            .page("http://tech.mit.edu/V109/N2/", ISSUE_2)
            .page(
                "http://tech.mit.edu/V109/N1/a.html",
                r#"<div id="main">A graduate student died Tuesday.</div>"#,
            )
            .page(
                "http://tech.mit.edu/V109/N1/b.html",
                r#"<div id="main">Turnout was high.</div>"#,
            )
            .page(
                "http://tech.mit.edu/V109/N2/deadline.html",
                r#"<div id="main">The grant funds suicide prevention.</div>"#,
            )
    }

    fn settings(keywords: &[&str], mode: FilterMode) -> Settings {
        HarvestConfig {
            first_volume: 109,
            last_volume: 109,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            mode,
            concurrency: 2,
            ..HarvestConfig::default()
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn test_headline_mode_end_to_end() {
        let site = archive();
        let harvester = Harvester::new(&site, settings(&["dies"], FilterMode::Headline), Shutdown::never());

        let report = harvester.run().await;

        assert_eq!(report.issues, 2);
        assert_eq!(report.records_total, 4);
        assert_eq!(
            report.records,
            vec![ArticleRecord {
                headline: "Man dies in accident".to_string(),
                url: "http://tech.mit.edu/V109/N1/a.html".to_string(),
                publication_date: "Jan 1, 1990".to_string(),
            }]
        );
        assert!(!report.cancelled);
        // "Next" has no href.
        assert_eq!(report.diagnostic_counts().get("headline-append failure"), Some(&1));
    }

    #[tokio::test]
    async fn test_full_article_mode_end_to_end() {
        let site = archive();
        let harvester = Harvester::new(
            &site,
            settings(&["died", "suicide"], FilterMode::FullArticle),
            Shutdown::never(),
        );

        let report = harvester.run().await;

        let urls: Vec<&str> = report.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://tech.mit.edu/V109/N1/a.html",
                "http://tech.mit.edu/V109/N2/deadline.html",
            ]
        );
        assert_eq!(site.request_count("http://tech.mit.edu/V109/N2/photo.jpg"), 0);
    }

    #[tokio::test]
    async fn test_discover_only_keeps_everything() {
        let site = archive();
        let mut settings = settings(&["dies"], FilterMode::Headline);
        settings.discover_only = true;
        let harvester = Harvester::new(&site, settings, Shutdown::never());

        let report = harvester.run().await;

        assert_eq!(report.records.len(), report.records_total);
        assert_eq!(report.records.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_issue_does_not_stop_run() {
        let site = StaticSite::new()
            .page("http://tech.mit.edu/V109/", VOLUME_109)
            .page("http://tech.mit.edu/V109/N2/", ISSUE_1);
        let harvester = Harvester::new(&site, settings(&["dies"], FilterMode::Headline), Shutdown::never());

        let report = harvester.run().await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.diagnostic_counts().get("issue-souping failure"), Some(&1));
    }

    #[tokio::test]
    async fn test_cancelled_run_still_reports() {
        let site = archive();
        let (tx, shutdown) = Shutdown::channel();
        tx.send(true).unwrap();
        let harvester = Harvester::new(&site, settings(&["dies"], FilterMode::Headline), shutdown);

        let report = harvester.run().await;

        assert!(report.cancelled);
        assert!(report.records.is_empty());
        assert!(site.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_mid_extraction_keeps_harvested_headlines() {
        const ISSUE_2_MATCH: &str = r#"<html><body><div id="main">
            <div>
              <a href="/V109/N2/">Issue N2</a>
              <a href="/V109/N2/">Date: Jan 5, 1990</a>
              <a href="/">Home</a>
              <a href="c.html">Professor dies at 80</a>
            </div>
            </div></body></html>"#;
        let (tx, shutdown) = Shutdown::channel();
        let site = StaticSite::new()
            .page("http://tech.mit.edu/V109/", VOLUME_109)
            .page("http://tech.mit.edu/V109/N1/", ISSUE_1)
            .page("http://tech.mit.edu/V109/N2/", ISSUE_2_MATCH)
            .cancel_on("http://tech.mit.edu/V109/N2/", tx);
        let mut settings = settings(&["dies"], FilterMode::Headline);
        settings.concurrency = 1;
        let harvester = Harvester::new(&site, settings, shutdown);

        let report = harvester.run().await;

        assert!(report.cancelled);
        assert_eq!(report.records_total, 3);
        let headlines: Vec<&str> = report.records.iter().map(|r| r.headline.as_str()).collect();
        assert_eq!(headlines, vec!["Man dies in accident", "Professor dies at 80"]);
    }

    #[tokio::test]
    async fn test_base_url_with_path() {
        let site = StaticSite::new()
            .page("http://host/archive/V109/", VOLUME_109)
            .page("http://host/archive/V109/N1/", ISSUE_1);
        let settings = HarvestConfig {
            base_url: "http://host/archive".to_string(),
            first_volume: 109,
            last_volume: 109,
            keywords: vec!["dies".to_string()],
            ..HarvestConfig::default()
        }
        .validate()
        .unwrap();
        let harvester = Harvester::new(&site, settings, Shutdown::never());

        let report = harvester.run().await;

        assert_eq!(report.issues, 2);
        let urls: Vec<&str> = report.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://host/archive/V109/N1/a.html"]);
    }

    #[tokio::test]
    async fn test_identical_archives_give_identical_output() {
        let mut outputs = Vec::new();
        for _ in 0..2 {
            let site = archive();
            let harvester = Harvester::new(
                &site,
                settings(&["dies", "election"], FilterMode::Headline),
                Shutdown::never(),
            );
            let report = harvester.run().await;

            let mut writer = csv::Writer::from_writer(Vec::new());
            write_records(&mut writer, HeaderStyle::Filtered, &report.records).unwrap();
            outputs.push(writer.into_inner().unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(
            String::from_utf8(outputs[0].clone()).unwrap(),
            "Headline,URL,Date\n\
             Man dies in accident,http://tech.mit.edu/V109/N1/a.html,\"Jan 1, 1990\"\n\
             Local election results,http://tech.mit.edu/V109/N1/b.html,\"Jan 1, 1990\"\n"
        );
    }
}
