//! HTTP client for the source site's section listings and article pages.

use std::time::Duration;

use chrono::NaiveDate;
use newsdesk_core::NewArticle;
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::parse::{extract_article_links, parse_article};

/// Fetches listing and article pages for one section of one site.
///
/// Non-2xx responses are returned as typed errors. There is no retry: a
/// failed page is reported to the caller, which decides whether to skip it.
pub struct SourceClient {
    client: Client,
    base_url: String,
    section: String,
}

impl SourceClient {
    /// Creates a `SourceClient` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` is not an absolute
    /// URL, or [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        section: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(|e| ScraperError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url,
            section: section.trim_matches('/').to_owned(),
        })
    }

    /// # Errors
    ///
    /// See [`SourceClient::new`].
    pub fn from_app_config(config: &newsdesk_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.source_base_url,
            &config.section,
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
        )
    }

    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Builds the url of listing page `page` (1-based) for the section.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the section does not form a
    /// valid URL with the base.
    pub fn listing_url(&self, page: u32) -> Result<Url, ScraperError> {
        let raw = format!("{}/{}", self.base_url, self.section);
        let mut url = Url::parse(&raw).map_err(|e| ScraperError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    /// GETs `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::NotFound`] on HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on network or TLS failure.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-GB,en;q=0.9")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }

    /// Fetches listing page `page` and returns the article links found on it.
    ///
    /// # Errors
    ///
    /// Returns any error from [`SourceClient::listing_url`] or
    /// [`SourceClient::fetch_html`].
    pub async fn fetch_listing_links(&self, page: u32) -> Result<Vec<String>, ScraperError> {
        let url = self.listing_url(page)?;
        let html = self.fetch_html(url.as_str()).await?;
        Ok(extract_article_links(&html, &url, &self.section))
    }

    /// Fetches and parses one article page.
    ///
    /// # Errors
    ///
    /// Returns any error from [`SourceClient::fetch_html`] or
    /// [`parse_article`].
    pub async fn fetch_article(
        &self,
        url: &str,
        fallback_date: NaiveDate,
    ) -> Result<NewArticle, ScraperError> {
        let html = self.fetch_html(url).await?;
        parse_article(&html, url, fallback_date)
    }
}
