//! Parsed article records as produced by the collector.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An article parsed from a detail page, not yet stored.
///
/// `url` is the natural key: storing the same url twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub url: String,
    pub section: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub body: Option<String>,
    pub published_on: NaiveDate,
}

impl NewArticle {
    /// Byline with surrounding whitespace removed; blank bylines count as absent.
    #[must_use]
    pub fn author_name(&self) -> Option<&str> {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
