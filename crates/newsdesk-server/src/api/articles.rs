use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;
const DEFAULT_TOP_AUTHORS: i64 = 5;
const MAX_TOP_AUTHORS: i64 = 100;

#[derive(Debug, Serialize)]
pub(super) struct ArticleItem {
    id: i64,
    url: String,
    section: Option<String>,
    title: String,
    author: Option<String>,
    body: Option<String>,
    published_on: NaiveDate,
    retrieved_at: DateTime<Utc>,
}

impl From<newsdesk_db::ArticleRow> for ArticleItem {
    fn from(row: newsdesk_db::ArticleRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            section: row.section,
            title: row.title,
            author: row.author,
            body: row.body,
            published_on: row.published_on,
            retrieved_at: row.retrieved_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ArticlePage {
    page: i64,
    per_page: i64,
    total: i64,
    items: Vec<ArticleItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct AuthorCountItem {
    author: String,
    article_count: i64,
}

/// Raw query pairs. Read as a list so repeated or malformed keys fall back
/// to defaults instead of rejecting the request.
type QueryPairs = Vec<(String, String)>;

/// Value of the last occurrence of `key`.
fn last_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

#[derive(Debug, Default)]
pub(super) struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl PageQuery {
    pub(super) fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            page: last_value(pairs, "page"),
            per_page: last_value(pairs, "per_page"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
}

impl Pagination {
    pub(super) fn from_query(query: &PageQuery) -> Self {
        let page = parse_number(query.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let per_page = parse_number(query.per_page.as_deref())
            .filter(|n| *n > 0)
            .map_or(DEFAULT_PER_PAGE, |n| n.min(MAX_PER_PAGE));
        Self { page, per_page }
    }

    /// Row offset of the first item, or `None` when the page can hold no rows.
    pub(super) fn offset(self) -> Option<i64> {
        if self.page < 1 {
            return None;
        }
        (self.page - 1).checked_mul(self.per_page)
    }
}

pub(super) fn normalize_top_authors_limit(raw: Option<&str>) -> i64 {
    parse_number(raw)
        .unwrap_or(DEFAULT_TOP_AUTHORS)
        .clamp(1, MAX_TOP_AUTHORS)
}

pub(super) async fn list_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<ApiResponse<ArticlePage>>, ApiError> {
    let pagination = Pagination::from_query(&PageQuery::from_pairs(&pairs));

    let total = newsdesk_db::count_articles(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = match pagination.offset() {
        Some(offset) if offset < total => {
            newsdesk_db::list_articles(&state.pool, pagination.per_page, offset)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        }
        _ => Vec::new(),
    };

    Ok(Json(ApiResponse {
        data: page_of(pagination, total, rows),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_today(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<ApiResponse<ArticlePage>>, ApiError> {
    let pagination = Pagination::from_query(&PageQuery::from_pairs(&pairs));
    let today = Local::now().date_naive();

    let total = newsdesk_db::count_articles_published_on(&state.pool, today)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = match pagination.offset() {
        Some(offset) if offset < total => newsdesk_db::list_articles_published_on(
            &state.pool,
            today,
            pagination.per_page,
            offset,
        )
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
        _ => Vec::new(),
    };

    Ok(Json(ApiResponse {
        data: page_of(pagination, total, rows),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn latest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Option<ArticleItem>>>, ApiError> {
    let row = newsdesk_db::latest_article(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.map(ArticleItem::from),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn top_authors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<ApiResponse<Vec<AuthorCountItem>>>, ApiError> {
    let limit = normalize_top_authors_limit(last_value(&pairs, "limit").as_deref());

    let rows = newsdesk_db::top_authors(&state.pool, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| AuthorCountItem {
            author: row.author,
            article_count: row.article_count,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn page_of(pagination: Pagination, total: i64, rows: Vec<newsdesk_db::ArticleRow>) -> ArticlePage {
    ArticlePage {
        page: pagination.page,
        per_page: pagination.per_page,
        total,
        items: rows.into_iter().map(ArticleItem::from).collect(),
    }
}
