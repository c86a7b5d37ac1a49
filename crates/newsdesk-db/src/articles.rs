//! Database operations for the `articles` table.
//!
//! Rows are append-only: an article is written once, keyed by url, and never
//! updated or deleted afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use newsdesk_core::NewArticle;
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub url: String,
    pub section: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub body: Option<String>,
    pub published_on: NaiveDate,
    pub retrieved_at: DateTime<Utc>,
}

/// One entry of the author frequency ranking.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AuthorCountRow {
    pub author: String,
    pub article_count: i64,
}

/// Inserts an article stamped with the current time unless its url is
/// already stored.
///
/// Returns `true` when a row was written, `false` when the url existed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_article_if_new(
    pool: &SqlitePool,
    article: &NewArticle,
) -> Result<bool, DbError> {
    insert_article_at(pool, article, Utc::now()).await
}

/// Same as [`insert_article_if_new`] with an explicit retrieval timestamp.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_article_at(
    pool: &SqlitePool,
    article: &NewArticle,
    retrieved_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO articles \
         (url, section, title, author, body, published_on, retrieved_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (url) DO NOTHING",
    )
    .bind(&article.url)
    .bind(article.section.as_deref())
    .bind(article.title.trim())
    .bind(article.author_name())
    .bind(article.body.as_deref())
    .bind(article.published_on)
    .bind(retrieved_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Returns whether an article with this url is already stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn article_exists(pool: &SqlitePool, url: &str) -> Result<bool, DbError> {
    let found: i64 = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM articles WHERE url = ?)")
        .bind(url)
        .fetch_one(pool)
        .await?;
    Ok(found != 0)
}

/// Total number of stored articles.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_articles(pool: &SqlitePool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_articles(pool: &SqlitePool) -> Result<bool, DbError> {
    Ok(count_articles(pool).await? > 0)
}

/// Lists articles in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, url, section, title, author, body, published_on, retrieved_at \
         FROM articles \
         ORDER BY id ASC \
         LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Number of articles whose publication date is `date`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_articles_published_on(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<i64, DbError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles WHERE published_on = ?")
            .bind(date)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Lists articles published on `date`, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles_published_on(
    pool: &SqlitePool,
    date: NaiveDate,
    limit: i64,
    offset: i64,
) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, url, section, title, author, body, published_on, retrieved_at \
         FROM articles \
         WHERE published_on = ? \
         ORDER BY id ASC \
         LIMIT ? OFFSET ?",
    )
    .bind(date)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the most recently retrieved article, or `None` for an empty table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_article(pool: &SqlitePool) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, url, section, title, author, body, published_on, retrieved_at \
         FROM articles \
         ORDER BY retrieved_at DESC, id DESC \
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Ranks authors by number of stored articles, most prolific first.
///
/// Ties are ordered by author name. Articles without a byline are ignored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_authors(pool: &SqlitePool, limit: i64) -> Result<Vec<AuthorCountRow>, DbError> {
    let rows = sqlx::query_as::<_, AuthorCountRow>(
        "SELECT author, COUNT(*) AS article_count \
         FROM articles \
         WHERE author IS NOT NULL AND author <> '' \
         GROUP BY author \
         ORDER BY article_count DESC, author ASC \
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
