//! Scraping the newspaper archive.
//!
//! The archive is laid out as volume index pages (`/V<vol>/`), each linking to
//! the issues of that year (`/V<vol>/N<issue>/`), each listing the articles of
//! that issue in dated blocks. Harvesting follows the same two phases the
//! archive imposes:
//!
//! 1. **Discovery** ([`issues`]): walk the volume index pages and collect issue URLs
//! 2. **Extraction** ([`articles`]): parse each issue page into [`ArticleRecord`]s
//!
//! [`links`] holds the URL resolution rules both phases share.
//!
//! Failures never abort a phase. Every dropped volume, issue or anchor comes
//! back as a [`SkipReason`] next to whatever was harvested.
//!
//! [`ArticleRecord`]: crate::models::ArticleRecord

use crate::errors::SkipReason;

pub mod articles;
pub mod issues;
pub mod links;

/// Items harvested from one unit of work plus the reasons anything was
/// dropped along the way.
#[derive(Debug)]
pub struct Harvested<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkipReason>,
}

impl<T> Default for Harvested<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Harvested<T> {
    /// Nothing harvested, one reason.
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            items: Vec::new(),
            skipped: vec![reason],
        }
    }

    /// Append another unit's results, keeping order.
    pub fn absorb(&mut self, other: Harvested<T>) {
        self.items.extend(other.items);
        self.skipped.extend(other.skipped);
    }
}

impl<T> FromIterator<Harvested<T>> for Harvested<T> {
    fn from_iter<I: IntoIterator<Item = Harvested<T>>>(iter: I) -> Self {
        let mut all = Harvested::default();
        for part in iter {
            all.absorb(part);
        }
        all
    }
}
