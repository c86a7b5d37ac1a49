//! URL helpers for the source site's article addressing scheme.
//!
//! Article pages live at `/{section}/{yyyy}/{mon}/{d}/{slug}`, where `mon` is
//! a lowercase month name or abbreviation (`oct`, `sept`, `october`).

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use reqwest::Url;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn dated_article_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/([^/]+)/(\d{4})/([a-z]{3,9})/(\d{1,2})/[^/]+")
            .expect("valid dated article path regex")
    })
}

fn date_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/(\d{4})/([a-z]{3,9})/(\d{1,2})/").expect("valid date segment regex")
    })
}

/// Maps `jan`..`dec` (or any longer spelling sharing that prefix) to 1..=12.
#[must_use]
pub fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

/// Returns `true` when `url` is a dated article in `section` on the same host
/// as `site`.
#[must_use]
pub fn is_section_article(url: &Url, site: &Url, section: &str) -> bool {
    if url.host_str() != site.host_str()
        || url.port_or_known_default() != site.port_or_known_default()
    {
        return false;
    }

    dated_article_path()
        .captures(url.path())
        .is_some_and(|caps| {
            caps.get(1).map(|m| m.as_str()) == Some(section)
                && caps.get(3).and_then(|m| month_number(m.as_str())).is_some()
        })
}

/// Extracts the publication date encoded in an article url.
#[must_use]
pub fn published_on_from_url(url: &str) -> Option<NaiveDate> {
    let caps = date_segment().captures(url)?;
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = month_number(caps.get(2)?.as_str())?;
    let day = caps.get(3)?.as_str().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The first path segment of an article url, which names its section.
#[must_use]
pub fn section_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .find(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
}

/// Resolves `href` against `page` and strips query and fragment.
#[must_use]
pub fn canonicalize_link(href: &str, page: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut resolved = page.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_query(None);
    resolved.set_fragment(None);
    Some(resolved)
}
