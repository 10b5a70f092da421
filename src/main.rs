//! # Tech Headline Harvest
//!
//! Walks a student newspaper's online archive volume by volume, collects every
//! headline printed in it, keeps the ones that mention a configured keyword and
//! writes them to a CSV file.
//!
//! ## Usage
//!
//! ```sh
//! tech_headline_harvest -o filtered_headlines.csv
//! tech_headline_harvest --mode full-article -j 8 --keywords died,dead,suicide
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Discovery**: Fetch each volume index page and collect its issue URLs
//! 2. **Extraction**: Parse every issue page into (headline, URL, date) records
//! 3. **Filtering**: Match records on headline text or on the fetched article body
//! 4. **Output**: Write the surviving records to a CSV file
//!
//! Failed pages are logged and skipped; only configuration problems stop the
//! run, and they are caught before the first request goes out.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod archive;
mod cli;
mod config;
mod errors;
mod fetcher;
mod filter;
mod models;
mod outputs;
mod pipeline;
mod shutdown;
mod utils;

use cli::Cli;
use config::HarvestConfig;
use fetcher::HttpSource;
use outputs::tabular::{self, HeaderStyle};
use pipeline::Harvester;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("tech_headline_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration (fatal errors only from here) ----
    let settings = match HarvestConfig::load(&args).and_then(|c| c.validate()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        base_url = %settings.base_url,
        first_volume = *settings.volumes.start(),
        last_volume = *settings.volumes.end(),
        mode = ?settings.mode,
        keywords = %settings.keywords,
        keyword_count = settings.keywords.len(),
        concurrency = settings.concurrency,
        discover_only = settings.discover_only,
        "Loaded configuration"
    );

    // Early check: the output file must be creatable before any fetching.
    let mut writer = match tabular::open_output(&settings.output) {
        Ok(writer) => writer,
        Err(e) => {
            error!(error = %e, "Output file is not writable (fix perms or choose a different path)");
            return Err(e.into());
        }
    };

    // ---- Harvest ----
    let shutdown = shutdown::install_ctrl_c_handler();
    let style = if settings.discover_only {
        HeaderStyle::DiscoveryOnly
    } else {
        HeaderStyle::Filtered
    };
    let output_path = settings.output.display().to_string();
    let harvester = Harvester::new(HttpSource::new(), settings, shutdown);
    let report = harvester.run().await;

    for (category, count) in report.diagnostic_counts() {
        warn!(category, count, "Units skipped");
    }
    if report.cancelled {
        warn!(kept = report.records.len(), "Run was cancelled; writing partial results");
    }

    // ---- Output ----
    info!(path = %output_path, rows = report.records.len(), "Writing CSV");
    if let Err(e) = tabular::write_records(&mut writer, style, &report.records) {
        error!(path = %output_path, error = %e, "Failed writing CSV");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        headlines = report.records_total,
        kept = report.records.len(),
        "Execution complete"
    );

    Ok(())
}
