//! Collection runs: walk listing pages, fetch new articles, store them.
//!
//! A run is sequential. Failures on a single listing page or article are
//! logged and counted, never fatal to the run. Storage failures abort the
//! run because nothing later in it could be saved either.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::client::SourceClient;
use crate::error::ScraperError;

/// Page counts for the first run of a process and for every later run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSettings {
    pub initial_pages: u32,
    pub pages_per_run: u32,
}

impl CollectorSettings {
    #[must_use]
    pub fn from_app_config(config: &newsdesk_core::AppConfig) -> Self {
        Self {
            initial_pages: config.initial_pages,
            pages_per_run: config.pages_per_run,
        }
    }
}

/// Counters reported at the end of a collection run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    /// 1-based number of this run within the process.
    pub run_number: u64,
    pub pages_requested: u32,
    pub pages_failed: u32,
    pub links_found: usize,
    pub skipped_known: usize,
    pub inserted: usize,
    pub articles_failed: usize,
}

/// Drives collection runs against one source section into one pool.
///
/// Runs never overlap: [`Collector::run`] waits for an in-flight run to
/// finish, [`Collector::try_run`] skips instead.
pub struct Collector {
    client: SourceClient,
    pool: SqlitePool,
    settings: CollectorSettings,
    runs: AtomicU64,
    run_lock: Mutex<()>,
}

impl Collector {
    #[must_use]
    pub fn new(client: SourceClient, pool: SqlitePool, settings: CollectorSettings) -> Self {
        Self {
            client,
            pool,
            settings,
            runs: AtomicU64::new(0),
            run_lock: Mutex::new(()),
        }
    }

    /// Number of listing pages the next [`Collector::run`] will walk.
    ///
    /// `initial_pages` applies only to the first run of the process against
    /// an empty table; otherwise `pages_per_run`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Storage`] if the table cannot be queried.
    pub async fn pages_for_next_run(&self) -> Result<u32, ScraperError> {
        let first_run = self.runs.load(Ordering::SeqCst) == 0;
        if first_run && !newsdesk_db::has_articles(&self.pool).await? {
            Ok(self.settings.initial_pages)
        } else {
            Ok(self.settings.pages_per_run)
        }
    }

    #[must_use]
    pub fn runs_started(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Runs one collection pass, waiting for any in-flight run to finish.
    ///
    /// The first run of the process walks `initial_pages` listing pages when
    /// nothing is stored yet; every other run walks `pages_per_run`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Storage`] if the database cannot be read or
    /// written. Fetch and parse failures are counted in the summary.
    pub async fn run(&self) -> Result<CollectionSummary, ScraperError> {
        let _guard = self.run_lock.lock().await;
        self.run_locked(None).await
    }

    /// Like [`Collector::run`], but returns `None` immediately when another
    /// run holds the lock.
    ///
    /// # Errors
    ///
    /// See [`Collector::run`].
    pub async fn try_run(&self) -> Option<Result<CollectionSummary, ScraperError>> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::warn!("collector: previous run still in progress; skipping");
            return None;
        };
        Some(self.run_locked(None).await)
    }

    /// Runs one pass over exactly `pages` listing pages.
    ///
    /// Counts as a run for [`Collector::pages_for_next_run`].
    ///
    /// # Errors
    ///
    /// See [`Collector::run`].
    pub async fn run_pages(&self, pages: u32) -> Result<CollectionSummary, ScraperError> {
        let _guard = self.run_lock.lock().await;
        self.run_locked(Some(pages)).await
    }

    async fn run_locked(&self, pages: Option<u32>) -> Result<CollectionSummary, ScraperError> {
        let pages = match pages {
            Some(pages) => pages,
            None => self.pages_for_next_run().await?,
        };
        let run_number = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let section = self.client.section();

        tracing::info!(run_number, pages, section, "collector: starting run");

        let mut summary = CollectionSummary {
            run_number,
            pages_requested: pages,
            ..CollectionSummary::default()
        };

        for page in 1..=pages {
            let links = match self.client.fetch_listing_links(page).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(page, error = %e, "collector: listing page failed");
                    summary.pages_failed += 1;
                    continue;
                }
            };

            tracing::debug!(page, links = links.len(), "collector: listing page parsed");
            summary.links_found += links.len();

            for url in &links {
                self.collect_article(url, &mut summary).await?;
            }
        }

        tracing::info!(
            run_number,
            pages_requested = summary.pages_requested,
            pages_failed = summary.pages_failed,
            links_found = summary.links_found,
            skipped_known = summary.skipped_known,
            inserted = summary.inserted,
            articles_failed = summary.articles_failed,
            "collector: run complete"
        );

        Ok(summary)
    }

    async fn collect_article(
        &self,
        url: &str,
        summary: &mut CollectionSummary,
    ) -> Result<(), ScraperError> {
        if newsdesk_db::article_exists(&self.pool, url).await? {
            summary.skipped_known += 1;
            return Ok(());
        }

        let fallback_date = Local::now().date_naive();
        let article = match self.client.fetch_article(url, fallback_date).await {
            Ok(article) => article,
            Err(e) => {
                tracing::warn!(url, error = %e, "collector: article failed");
                summary.articles_failed += 1;
                return Ok(());
            }
        };

        if newsdesk_db::insert_article_if_new(&self.pool, &article).await? {
            tracing::debug!(url, title = %article.title, "collector: article stored");
            summary.inserted += 1;
        } else {
            summary.skipped_known += 1;
        }

        Ok(())
    }
}
