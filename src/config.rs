//! Layered run configuration.
//!
//! Built-in defaults, then an optional YAML file, then command-line flags.
//! [`HarvestConfig::validate`] turns the merged values into [`Settings`] and
//! is the only place a [`ConfigError`] can come from before the run starts.
//!
//! ```yaml
//! base_url: http://tech.mit.edu
//! first_volume: 109
//! last_volume: 135
//! mode: headline
//! concurrency: 4
//! keywords: [death, died, dead, suicide, dies]
//! ```

use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::cli::Cli;
use crate::errors::ConfigError;
use crate::filter::FilterMode;
use crate::models::KeywordSet;

pub const DEFAULT_BASE_URL: &str = "http://tech.mit.edu";
pub const DEFAULT_FIRST_VOLUME: u32 = 109;
pub const DEFAULT_LAST_VOLUME: u32 = 135;
pub const DEFAULT_OUTPUT: &str = "filtered_headlines.csv";
pub const DEFAULT_KEYWORDS: [&str; 9] = [
    "death",
    "died",
    "dead",
    "suicide",
    "dies",
    "kills himself",
    "kills herself",
    "takes life",
    "fell",
];

/// How issue links are read off a volume index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueLinkStyle {
    /// The anchor's `href` attribute.
    #[default]
    Attribute,
    /// Fixed character offsets into the serialized anchor.
    Legacy,
}

/// Raw, unvalidated configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    pub base_url: String,
    pub first_volume: u32,
    pub last_volume: u32,
    pub keywords: Vec<String>,
    pub mode: FilterMode,
    pub concurrency: usize,
    pub issue_links: IssueLinkStyle,
    pub output: String,
    pub discover_only: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            first_volume: DEFAULT_FIRST_VOLUME,
            last_volume: DEFAULT_LAST_VOLUME,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            mode: FilterMode::Headline,
            concurrency: 1,
            issue_links: IssueLinkStyle::Attribute,
            output: DEFAULT_OUTPUT.to_string(),
            discover_only: false,
        }
    }
}

/// Validated settings the pipeline runs with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub volumes: RangeInclusive<u32>,
    pub keywords: KeywordSet,
    pub mode: FilterMode,
    pub concurrency: usize,
    pub issue_links: IssueLinkStyle,
    pub output: PathBuf,
    pub discover_only: bool,
}

impl HarvestConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(path: &str, yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::ConfigParse {
            path: path.to_string(),
            source,
        })
    }

    /// Read and parse a YAML config file.
    #[instrument(level = "info")]
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFile {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(path, &yaml)
    }

    /// Defaults, overlaid with the config file named on the command line,
    /// overlaid with the command-line flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        debug!(?config, "Merged configuration");
        Ok(config)
    }

    /// Overwrite every field the command line sets.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(first) = cli.first_volume {
            self.first_volume = first;
        }
        if let Some(last) = cli.last_volume {
            self.last_volume = last;
        }
        if let Some(keywords) = &cli.keywords {
            self.keywords = keywords.clone();
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if cli.legacy_issue_links {
            self.issue_links = IssueLinkStyle::Legacy;
        }
        if let Some(output) = &cli.output {
            self.output = output.clone();
        }
        if cli.discover_only {
            self.discover_only = true;
        }
    }

    /// Check every value and build [`Settings`].
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let mut base_url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "expected an http(s) URL with a host".to_string(),
            });
        }
        // Archive paths are appended to the base, so it must name a directory.
        if !base_url.path().ends_with('/') {
            let dir = format!("{}/", base_url.path());
            base_url.set_path(&dir);
        }

        if self.first_volume == 0 || self.first_volume > self.last_volume {
            return Err(ConfigError::InvalidVolumeRange {
                first: self.first_volume,
                last: self.last_volume,
            });
        }

        let keywords = KeywordSet::new(&self.keywords);
        if keywords.is_empty() {
            return Err(ConfigError::EmptyKeywords);
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        Ok(Settings {
            base_url,
            volumes: self.first_volume..=self.last_volume,
            keywords,
            mode: self.mode,
            concurrency: self.concurrency,
            issue_links: self.issue_links,
            output: PathBuf::from(&self.output),
            discover_only: self.discover_only,
        })
    }
}
