//! Turning anchors into absolute, fetchable URLs.
//!
//! Issue links on a volume index page are read through an [`IssueLinkResolver`].
//! [`HrefResolver`] reads the `href` attribute and is what every run uses unless
//! told otherwise. [`LegacyOffsetResolver`] reproduces the old fixed-offset
//! slicing of the serialized anchor; it only understands anchors serialized
//! exactly as `<a href="/V<vol>/N<issue>/">` and is kept as a compatibility shim
//! for that markup.
//!
//! Article links on an issue page come in two shapes:
//!
//! | Link target | Resolved against |
//! |-------------|------------------|
//! | `/V119/N46/Story.html` | site base URL, appended to its path |
//! | `Story.46a.html` | the issue URL |

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use url::Url;

use crate::errors::SkipReason;

static VOLUME_ISSUE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/V\d+/N\d+").expect("static regex"));

static AUTHOR_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/author/").expect("static regex"));

/// Maps an "Issue" anchor on a volume index page to the issue's URL.
pub trait IssueLinkResolver {
    fn issue_url(
        &self,
        anchor: ElementRef<'_>,
        base_url: &Url,
        volume_url: &Url,
    ) -> Result<String, SkipReason>;
}

/// Reads the anchor's `href`. Site-absolute paths are appended to the base
/// URL; anything else is resolved against the volume index URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct HrefResolver;

impl IssueLinkResolver for HrefResolver {
    fn issue_url(
        &self,
        anchor: ElementRef<'_>,
        base_url: &Url,
        volume_url: &Url,
    ) -> Result<String, SkipReason> {
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| SkipReason::MissingHref {
                anchor: anchor.html(),
            })?
            .trim();
        let resolved = if href.starts_with('/') && !href.starts_with("//") {
            join_onto_base(base_url, href)
        } else {
            volume_url.join(href)
        };
        resolved.map(|u| u.to_string()).map_err(|e| SkipReason::BadLink {
            href: href.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Slices characters 11..19 out of the serialized anchor and appends them to
/// `<base>/V`. For single-digit issue numbers the slice ends in the closing
/// quote of the attribute, which is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyOffsetResolver;

impl LegacyOffsetResolver {
    const START: usize = 11;
    const END: usize = 19;

    fn slice(serialized: &str) -> Option<&str> {
        let start = serialized.char_indices().nth(Self::START)?.0;
        let end = serialized
            .char_indices()
            .nth(Self::END)
            .map(|(i, _)| i)
            .unwrap_or(serialized.len());
        serialized.get(start..end)
    }
}

impl IssueLinkResolver for LegacyOffsetResolver {
    fn issue_url(
        &self,
        anchor: ElementRef<'_>,
        base_url: &Url,
        _volume_url: &Url,
    ) -> Result<String, SkipReason> {
        let serialized = anchor.html();
        let slice = Self::slice(&serialized).ok_or_else(|| SkipReason::BadLink {
            href: serialized.clone(),
            reason: "anchor too short for fixed offsets".to_string(),
        })?;
        let mut url = format!("{}/V{slice}", base_url.as_str().trim_end_matches('/'));
        if url.ends_with('"') {
            url.pop();
        }
        Url::parse(&url)
            .map(|u| u.to_string())
            .map_err(|e| SkipReason::BadLink {
                href: serialized.clone(),
                reason: e.to_string(),
            })
    }
}

/// Append a site-absolute `path` to `base_url`, keeping any path the base
/// already has (`http://host/archive` + `/V1/N2/` is
/// `http://host/archive/V1/N2/`).
pub fn join_onto_base(base_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut dir = base_url.clone();
    if !dir.path().ends_with('/') {
        let with_slash = format!("{}/", dir.path());
        dir.set_path(&with_slash);
    }
    dir.join(path.trim_start_matches('/'))
}

/// True when the link target is a byline rather than an article.
pub fn is_author_link(href: &str) -> bool {
    AUTHOR_SEGMENT.is_match(href)
}

/// Resolve an article link found on `issue_url`.
///
/// Targets that already start with `/V<digits>/N<digits>` are resolved against
/// `base_url`, keeping its path; everything else is resolved relative to the issue page.
pub fn resolve_article_url(base_url: &Url, issue_url: &Url, href: &str) -> Result<Url, SkipReason> {
    let href = href.trim();
    let resolved = if VOLUME_ISSUE_PREFIX.is_match(href) {
        join_onto_base(base_url, href)
    } else {
        issue_url.join(href)
    };
    resolved.map_err(|e| SkipReason::BadLink {
        href: href.to_string(),
        reason: e.to_string(),
    })
}
