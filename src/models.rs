//! Data model for the archive harvest.
//!
//! - [`VolumeRef`]: one yearly volume of the archive, mapped to its index page
//! - [`IssueRef`]: the absolute URL of one issue's landing page
//! - [`ArticleRecord`]: a headline harvested from an issue page
//! - [`KeywordSet`]: the lowercase keywords records are filtered against
//!
//! Records are never mutated after extraction. Filtering only drops them.

use std::collections::HashSet;

use itertools::Itertools;

/// A volume number in the archive.
///
/// Volume 109 is the 1990 volume and every later year adds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VolumeRef(pub u32);

impl VolumeRef {
    /// URL of the volume's index page, `<base>/V<number>/`.
    pub fn index_url(&self, base_url: &str) -> String {
        format!("{}/V{}/", base_url.trim_end_matches('/'), self.0)
    }
}

/// Absolute URL of one issue's landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef(pub String);

impl IssueRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One harvested headline.
///
/// Every record in the same dated block of an issue page shares its
/// `publication_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// Anchor text of the headline. May be empty.
    pub headline: String,
    /// Absolute article URL.
    pub url: String,
    /// Date text as printed on the issue page.
    pub publication_date: String,
}

/// Lowercase keywords a record is tested against.
///
/// Single words match a token exactly. Entries with inner whitespace
/// (`kills himself`) match when their words appear consecutively.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    words: HashSet<String>,
    phrases: Vec<Vec<String>>,
    ordered: Vec<String>,
}

impl KeywordSet {
    /// Build a set from raw entries. Entries are trimmed and lowercased and
    /// blank or repeated entries are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = KeywordSet::default();
        for entry in entries {
            let normalized = entry
                .as_ref()
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>();
            if normalized.is_empty() {
                continue;
            }
            let joined = normalized.join(" ");
            if set.ordered.contains(&joined) {
                continue;
            }
            if normalized.len() == 1 {
                set.words.insert(joined.clone());
            } else {
                set.phrases.push(normalized);
            }
            set.ordered.push(joined);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Entries in configuration order.
    pub fn entries(&self) -> &[String] {
        &self.ordered
    }

    /// True when any single-word keyword equals a token or any phrase occurs
    /// as a run of consecutive tokens. Tokens must already be lowercase.
    pub fn matches_tokens(&self, tokens: &[String]) -> bool {
        if tokens.iter().any(|t| self.words.contains(t)) {
            return true;
        }
        self.phrases.iter().any(|phrase| {
            tokens
                .windows(phrase.len())
                .any(|window| window == phrase.as_slice())
        })
    }
}

impl std::fmt::Display for KeywordSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.ordered.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_volume_index_url() {
        assert_eq!(
            VolumeRef(109).index_url("http://tech.mit.edu"),
            "http://tech.mit.edu/V109/"
        );
        assert_eq!(
            VolumeRef(135).index_url("http://tech.mit.edu/"),
            "http://tech.mit.edu/V135/"
        );
    }

    #[test]
    fn test_keyword_set_normalizes_entries() {
        let set = KeywordSet::new(["  Death ", "died", "", "DIED", "Kills   Himself"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.entries(), &["death", "died", "kills himself"]);
        assert_eq!(set.to_string(), "[death, died, kills himself]");
    }

    #[test]
    fn test_keyword_set_blank_is_empty() {
        assert!(KeywordSet::new(["", "   "]).is_empty());
    }

    #[test]
    fn test_single_word_matches_exact_token() {
        let set = KeywordSet::new(["dead"]);
        assert!(set.matches_tokens(&tokens(&["found", "dead"])));
        assert!(!set.matches_tokens(&tokens(&["deadline", "extended"])));
    }

    #[test]
    fn test_phrase_matches_consecutive_tokens() {
        let set = KeywordSet::new(["takes life"]);
        assert!(set.matches_tokens(&tokens(&["student", "takes", "life"])));
        assert!(!set.matches_tokens(&tokens(&["takes", "a", "life"])));
        assert!(!set.matches_tokens(&tokens(&["life", "takes"])));
    }
}
