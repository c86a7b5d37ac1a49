//! HTML extraction for listing pages and article pages.
//!
//! Every field is read through a short chain of selectors, most specific
//! first. Only a missing headline makes a page unusable; author and body are
//! stored as absent when none of their selectors match.

use std::collections::HashSet;

use chrono::NaiveDate;
use newsdesk_core::NewArticle;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::urls::{canonicalize_link, is_section_article, published_on_from_url, section_from_url};

const LISTING_LINK_SELECTOR: &str = "div.fc-item__content a[href]";
const ANY_LINK_SELECTOR: &str = "a[href]";

const TITLE_SELECTORS: &[&str] = &["div[data-gu-name=\"headline\"] h1", "h1"];
const AUTHOR_SELECTORS: &[&str] = &[
    "a[rel=\"author\"][data-link-name=\"auto tag link\"]",
    "a[rel=\"author\"]",
];
const BODY_CONTAINER_SELECTORS: &[&str] = &["div[data-gu-name=\"body\"]", "div#maincontent"];
const BODY_FALLBACK_SELECTOR: &str = "article";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Collapses runs of whitespace into single spaces and trims the ends.
fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        document
            .select(&selector(css))
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .filter_map(|el| el.value().attr("content"))
        .map(clean_text)
        .find(|text| !text.is_empty())
}

/// All text of a dedicated body container, headings and list items included.
fn container_text(container: ElementRef<'_>) -> Option<String> {
    let text = element_text(container);
    (!text.is_empty()).then_some(text)
}

/// Paragraphs of a generic `<article>` joined by blank lines, or its
/// flattened text when it has no `<p>` children.
fn paragraph_text(container: ElementRef<'_>) -> Option<String> {
    let paragraph = selector("p");
    let paragraphs: Vec<String> = container
        .select(&paragraph)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    let text = if paragraphs.is_empty() {
        element_text(container)
    } else {
        paragraphs.join("\n\n")
    };

    (!text.is_empty()).then_some(text)
}

/// Extracts links to dated `section` articles from a listing page.
///
/// Anchors inside listing cards are preferred; when the page has no cards,
/// every anchor on the page is considered. Links are resolved against
/// `page_url`, canonicalized, filtered to the same host and section, and
/// de-duplicated with the first occurrence kept.
#[must_use]
pub fn extract_article_links(html: &str, page_url: &Url, section: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut hrefs: Vec<&str> = document
        .select(&selector(LISTING_LINK_SELECTOR))
        .filter_map(|el| el.value().attr("href"))
        .collect();
    if hrefs.is_empty() {
        hrefs = document
            .select(&selector(ANY_LINK_SELECTOR))
            .filter_map(|el| el.value().attr("href"))
            .collect();
    }

    let mut seen = HashSet::new();
    hrefs
        .into_iter()
        .filter_map(|href| canonicalize_link(href, page_url))
        .filter(|url| is_section_article(url, page_url, section))
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Parses an article page into a [`NewArticle`].
///
/// The publication date comes from the url; `fallback_date` is used when the
/// url does not carry one.
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] if the page has no headline.
pub fn parse_article(
    html: &str,
    url: &str,
    fallback_date: NaiveDate,
) -> Result<NewArticle, ScraperError> {
    let document = Html::parse_document(html);

    let title = first_text(&document, TITLE_SELECTORS)
        .or_else(|| meta_content(&document, "meta[property=\"og:title\"]"))
        .ok_or_else(|| ScraperError::Parse {
            url: url.to_owned(),
            reason: "no headline found".to_string(),
        })?;

    let author = first_text(&document, AUTHOR_SELECTORS)
        .or_else(|| meta_content(&document, "meta[name=\"author\"]"));

    let body = BODY_CONTAINER_SELECTORS
        .iter()
        .find_map(|css| {
            document
                .select(&selector(css))
                .next()
                .and_then(container_text)
        })
        .or_else(|| {
            document
                .select(&selector(BODY_FALLBACK_SELECTOR))
                .next()
                .and_then(paragraph_text)
        });

    Ok(NewArticle {
        url: url.to_owned(),
        section: section_from_url(url),
        title,
        author,
        body,
        published_on: published_on_from_url(url).unwrap_or(fallback_date),
    })
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
