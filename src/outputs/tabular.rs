//! CSV output of harvested records.
//!
//! The file is created before the harvest starts so an unwritable path is a
//! setup failure rather than a surprise after hours of fetching. Rows are a
//! pure function of the records, so identical harvests give byte-identical
//! files.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::Writer;
use tracing::{info, instrument};

use crate::errors::ConfigError;
use crate::models::ArticleRecord;

/// Which header row to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// Keyword-filtered output.
    Filtered,
    /// Every harvested headline, unfiltered.
    DiscoveryOnly,
}

impl HeaderStyle {
    pub fn columns(&self) -> [&'static str; 3] {
        match self {
            HeaderStyle::Filtered => ["Headline", "URL", "Date"],
            HeaderStyle::DiscoveryOnly => ["Headline Text", "Headline Link", "Headline Date"],
        }
    }
}

/// Create (or truncate) the output file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn open_output(path: &Path) -> Result<Writer<File>, ConfigError> {
    let writer = Writer::from_path(path).map_err(|source| ConfigError::Output {
        path: path.display().to_string(),
        source,
    })?;
    info!("Output file is writable");
    Ok(writer)
}

/// Write the header row and one row per record, then flush.
pub fn write_records<W: io::Write>(
    writer: &mut Writer<W>,
    style: HeaderStyle,
    records: &[ArticleRecord],
) -> Result<(), csv::Error> {
    writer.write_record(style.columns())?;
    for record in records {
        writer.write_record([
            record.headline.as_str(),
            record.url.as_str(),
            record.publication_date.as_str(),
        ])?;
    }
    writer.flush()?;
    info!(rows = records.len(), "Wrote CSV rows");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(style: HeaderStyle, records: &[ArticleRecord]) -> String {
        let mut writer = Writer::from_writer(Vec::new());
        write_records(&mut writer, style, records).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_only_for_empty_run() {
        assert_eq!(to_string(HeaderStyle::Filtered, &[]), "Headline,URL,Date\n");
        assert_eq!(
            to_string(HeaderStyle::DiscoveryOnly, &[]),
            "Headline Text,Headline Link,Headline Date\n"
        );
    }

    #[test]
    fn test_rows_are_escaped_and_utf8() {
        let records = vec![ArticleRecord {
            headline: "Café owner \"dies\", police say".to_string(),
            url: "http://tech.mit.edu/V109/N1/a.html".to_string(),
            publication_date: "Jan 1, 1990".to_string(),
        }];
        assert_eq!(
            to_string(HeaderStyle::Filtered, &records),
            "Headline,URL,Date\n\"Café owner \"\"dies\"\", police say\",http://tech.mit.edu/V109/N1/a.html,\"Jan 1, 1990\"\n"
        );
    }

    #[test]
    fn test_open_output_in_missing_directory_fails() {
        let err = open_output(Path::new("/nonexistent-dir/out.csv")).unwrap_err();
        assert!(matches!(err, ConfigError::Output { .. }));
    }

    #[test]
    fn test_open_output_creates_file() {
        let path = std::env::temp_dir().join(format!("harvest-open-{}.csv", std::process::id()));
        let mut writer = open_output(&path).unwrap();
        write_records(&mut writer, HeaderStyle::Filtered, &[]).unwrap();
        drop(writer);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Headline,URL,Date\n");
        let _ = std::fs::remove_file(&path);
    }
}
