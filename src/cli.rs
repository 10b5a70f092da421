//! Command-line interface definitions.
//!
//! Every option may also come from the YAML file named by `--config`; flags
//! given here win over the file, and the file wins over built-in defaults.

use clap::Parser;

use crate::filter::FilterMode;

/// Command-line arguments for the archive harvester.
///
/// # Examples
///
/// ```sh
/// # Headline-mode run over the whole archive
/// tech_headline_harvest -o filtered_headlines.csv
///
/// # Full-article mode over two volumes, eight pages at a time
/// tech_headline_harvest --first-volume 119 --last-volume 120 --mode full-article -j 8
///
/// # Every headline, no filtering
/// tech_headline_harvest --discover-only -o all_headlines.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output CSV file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Archive base URL
    #[arg(long, env = "HARVEST_BASE_URL")]
    pub base_url: Option<String>,

    /// First volume to harvest (inclusive)
    #[arg(long)]
    pub first_volume: Option<u32>,

    /// Last volume to harvest (inclusive)
    #[arg(long)]
    pub last_volume: Option<u32>,

    /// Comma-separated keywords, replacing the configured list
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,

    /// Match keywords against headlines or full article text
    #[arg(short, long, value_enum)]
    pub mode: Option<FilterMode>,

    /// Number of pages fetched at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Read issue links with the fixed-offset parser for old index markup
    #[arg(long)]
    pub legacy_issue_links: bool,

    /// Write every harvested headline without keyword filtering
    #[arg(long)]
    pub discover_only: bool,
}
