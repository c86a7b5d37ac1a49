//! Command handlers for the CLI.
//!
//! Each handler is called from `main` once config is loaded and the pool is
//! connected.

use newsdesk_scraper::{Collector, CollectorSettings, SourceClient};
use sqlx::SqlitePool;

/// Run a single collection pass over `pages` listing pages. When `pages` is
/// `None` an empty table gets the initial page count and a populated one the
/// steady-state count.
///
/// # Errors
///
/// Returns an error if migrations fail, the source client cannot be built,
/// or the run hits a storage failure. Individual page failures are counted in
/// the printed summary, not propagated.
pub(crate) async fn run_collect(
    pool: &SqlitePool,
    config: &newsdesk_core::AppConfig,
    pages: Option<u32>,
) -> anyhow::Result<()> {
    newsdesk_db::run_migrations(pool).await?;

    let client = SourceClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build source client: {e}"))?;
    let collector = Collector::new(
        client,
        pool.clone(),
        CollectorSettings::from_app_config(config),
    );

    let summary = match pages {
        Some(pages) => collector.run_pages(pages).await?,
        None => collector.run().await?,
    };

    println!(
        "collected {section}: {inserted} new, {skipped} already stored, {failed} failed \
         ({links} links over {pages} pages, {pages_failed} pages failed)",
        section = config.section,
        inserted = summary.inserted,
        skipped = summary.skipped_known,
        failed = summary.articles_failed,
        links = summary.links_found,
        pages = summary.pages_requested,
        pages_failed = summary.pages_failed,
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if a migration fails to apply.
pub(crate) async fn run_migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    let applied = newsdesk_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Print the total row count, today's row count, and the latest article url.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub(crate) async fn run_stats(pool: &SqlitePool) -> anyhow::Result<()> {
    newsdesk_db::run_migrations(pool).await?;

    let today = chrono::Local::now().date_naive();
    let total = newsdesk_db::count_articles(pool).await?;
    let published_today = newsdesk_db::count_articles_published_on(pool, today).await?;
    let latest = newsdesk_db::latest_article(pool).await?;

    println!("articles stored: {total}");
    println!("published {today}: {published_today}");
    match latest {
        Some(row) => println!("latest: {} ({})", row.url, row.retrieved_at),
        None => println!("latest: none"),
    }

    tracing::debug!(total, published_today, "stats printed");
    Ok(())
}
