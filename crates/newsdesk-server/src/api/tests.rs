use axum::body::{to_bytes, Body};
use axum::http::Request;
use chrono::{Duration, Local, NaiveDate, TimeZone, Utc};
use newsdesk_core::NewArticle;
use tower::ServiceExt;

use super::*;

const TOKEN: &str = "test-shutdown-token";

async fn test_state() -> AppState {
    let pool = newsdesk_db::connect_in_memory()
        .await
        .expect("in-memory pool");
    AppState {
        pool,
        shutdown: ShutdownHandle::new(),
    }
}

fn article(slug: &str, author: Option<&str>, published_on: NaiveDate) -> NewArticle {
    NewArticle {
        url: format!("https://www.theguardian.com/world/2026/oct/15/{slug}"),
        section: Some("world".to_string()),
        title: format!("Headline {slug}"),
        author: author.map(ToOwned::to_owned),
        body: Some(format!("Body {slug}")),
        published_on,
    }
}

async fn seed(pool: &SqlitePool, count: usize) {
    let date = NaiveDate::from_ymd_opt(2026, 10, 1).expect("date");
    for i in 0..count {
        newsdesk_db::insert_article_if_new(pool, &article(&format!("story-{i}"), None, date))
            .await
            .expect("insert article");
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json parse");
    (status, json)
}

async fn post_shutdown(app: Router, authorization: Option<&str>) -> StatusCode {
    let mut builder = Request::builder().method("POST").uri("/shutdown");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    app.oneshot(builder.body(Body::empty()).expect("request"))
        .await
        .expect("response")
        .status()
}

fn urls(json: &serde_json::Value) -> Vec<String> {
    json["data"]["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["url"].as_str().expect("url").to_string())
        .collect()
}

#[test]
fn api_error_internal_error_maps_to_500() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_ok_with_request_id_header() {
    let state = test_state().await;
    let app = build_app(state, ShutdownAuth::new(None));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-abc");
}

#[tokio::test]
async fn items_defaults_to_first_ten_in_insertion_order() {
    let state = test_state().await;
    seed(&state.pool, 12).await;
    let app = build_app(state, ShutdownAuth::new(None));

    let (status, json) = get_json(app, "/items").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["page"], 1);
    assert_eq!(json["data"]["per_page"], 10);
    assert_eq!(json["data"]["total"], 12);
    let expected: Vec<String> = (0..10)
        .map(|i| format!("https://www.theguardian.com/world/2026/oct/15/story-{i}"))
        .collect();
    assert_eq!(urls(&json), expected);
}

#[tokio::test]
async fn items_second_page_returns_remainder() {
    let state = test_state().await;
    seed(&state.pool, 12).await;
    let app = build_app(state, ShutdownAuth::new(None));

    let (_, json) = get_json(app, "/items?page=2&per_page=5").await;

    assert_eq!(json["data"]["total"], 12);
    assert_eq!(
        urls(&json),
        vec![
            "https://www.theguardian.com/world/2026/oct/15/story-5".to_string(),
            "https://www.theguardian.com/world/2026/oct/15/story-6".to_string(),
            "https://www.theguardian.com/world/2026/oct/15/story-7".to_string(),
            "https://www.theguardian.com/world/2026/oct/15/story-8".to_string(),
            "https://www.theguardian.com/world/2026/oct/15/story-9".to_string(),
        ]
    );
}

#[tokio::test]
async fn items_out_of_range_page_is_empty_not_error() {
    let state = test_state().await;
    seed(&state.pool, 3).await;

    for uri in ["/items?page=9", "/items?page=0", "/items?page=-1"] {
        let app = build_app(state.clone(), ShutdownAuth::new(None));
        let (status, json) = get_json(app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(json["data"]["total"], 3, "{uri}");
        assert!(urls(&json).is_empty(), "{uri} should return no items");
    }
}

#[tokio::test]
async fn items_garbage_params_fall_back_to_defaults() {
    let state = test_state().await;
    seed(&state.pool, 2).await;
    let app = build_app(state, ShutdownAuth::new(None));

    let (status, json) = get_json(app, "/items?page=abc&per_page=-3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["page"], 1);
    assert_eq!(json["data"]["per_page"], 10);
    assert_eq!(urls(&json).len(), 2);
}

#[tokio::test]
async fn items_repeated_params_are_not_rejected() {
    let state = test_state().await;
    seed(&state.pool, 3).await;
    let app = build_app(state, ShutdownAuth::new(None));

    let (status, json) = get_json(app, "/items?page=abc&page=2&per_page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["page"], 2);
    assert_eq!(
        urls(&json),
        vec!["https://www.theguardian.com/world/2026/oct/15/story-1".to_string()]
    );
}

#[tokio::test]
async fn today_returns_only_articles_dated_today() {
    let state = test_state().await;
    let today = Local::now().date_naive();
    let yesterday = today - Duration::days(1);
    newsdesk_db::insert_article_if_new(&state.pool, &article("old", None, yesterday))
        .await
        .expect("insert");
    newsdesk_db::insert_article_if_new(&state.pool, &article("fresh-a", None, today))
        .await
        .expect("insert");
    newsdesk_db::insert_article_if_new(&state.pool, &article("fresh-b", None, today))
        .await
        .expect("insert");
    let app = build_app(state, ShutdownAuth::new(None));

    let (status, json) = get_json(app, "/today?per_page=1&page=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(
        urls(&json),
        vec!["https://www.theguardian.com/world/2026/oct/15/fresh-b".to_string()]
    );
}

#[tokio::test]
async fn last_is_null_on_empty_table() {
    let state = test_state().await;
    let app = build_app(state, ShutdownAuth::new(None));

    let (status, json) = get_json(app, "/last").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn last_returns_most_recently_retrieved_article() {
    let state = test_state().await;
    let date = NaiveDate::from_ymd_opt(2026, 10, 15).expect("date");
    let early = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap();
    newsdesk_db::insert_article_at(&state.pool, &article("newer", None, date), late)
        .await
        .expect("insert");
    newsdesk_db::insert_article_at(&state.pool, &article("older", None, date), early)
        .await
        .expect("insert");
    let app = build_app(state, ShutdownAuth::new(None));

    let (_, json) = get_json(app, "/last").await;

    assert_eq!(
        json["data"]["url"],
        "https://www.theguardian.com/world/2026/oct/15/newer"
    );
    assert_eq!(json["data"]["title"], "Headline newer");
    assert_eq!(json["data"]["published_on"], "2026-10-15");
}

#[tokio::test]
async fn top_authors_ranks_by_count_then_name() {
    let state = test_state().await;
    let date = NaiveDate::from_ymd_opt(2026, 10, 15).expect("date");
    let bylines = [
        ("a1", Some("Zoe")),
        ("a2", Some("Zoe")),
        ("a3", Some("Bob")),
        ("a4", Some("Amy")),
        ("a5", None),
        ("a6", Some("Zoe")),
        ("a7", Some("Bob")),
    ];
    for (slug, author) in bylines {
        newsdesk_db::insert_article_if_new(&state.pool, &article(slug, author, date))
            .await
            .expect("insert");
    }
    let app = build_app(state, ShutdownAuth::new(None));

    let (status, json) = get_json(app, "/top-authors").await;

    assert_eq!(status, StatusCode::OK);
    let ranked: Vec<(String, i64)> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|r| {
            (
                r["author"].as_str().expect("author").to_string(),
                r["article_count"].as_i64().expect("count"),
            )
        })
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Zoe".to_string(), 3),
            ("Bob".to_string(), 2),
            ("Amy".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn top_authors_honours_limit() {
    let state = test_state().await;
    let date = NaiveDate::from_ymd_opt(2026, 10, 15).expect("date");
    for (slug, author) in [("b1", "Amy"), ("b2", "Bob"), ("b3", "Cat")] {
        newsdesk_db::insert_article_if_new(&state.pool, &article(slug, Some(author), date))
            .await
            .expect("insert");
    }
    let app = build_app(state.clone(), ShutdownAuth::new(None));
    let app_again = build_app(state, ShutdownAuth::new(None));

    let (_, json) = get_json(app, "/top-authors?limit=2").await;
    assert_eq!(json["data"].as_array().expect("data array").len(), 2);

    let (status, json) = get_json(app_again, "/top-authors?limit=x&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().expect("data array").len(), 1);
}

#[tokio::test]
async fn shutdown_without_token_is_unauthorized() {
    let state = test_state().await;
    let handle = state.shutdown.clone();
    let app = build_app(state, ShutdownAuth::new(Some(TOKEN.to_string())));

    assert_eq!(post_shutdown(app, None).await, StatusCode::UNAUTHORIZED);
    assert!(!handle.is_triggered());
}

#[tokio::test]
async fn shutdown_with_wrong_token_is_unauthorized() {
    let state = test_state().await;
    let handle = state.shutdown.clone();
    let app = build_app(state, ShutdownAuth::new(Some(TOKEN.to_string())));

    assert_eq!(
        post_shutdown(app, Some("Bearer not-the-token")).await,
        StatusCode::UNAUTHORIZED
    );
    assert!(!handle.is_triggered());
}

#[tokio::test]
async fn shutdown_is_refused_when_no_token_configured() {
    let state = test_state().await;
    let handle = state.shutdown.clone();
    let app = build_app(state, ShutdownAuth::new(None));

    assert_eq!(
        post_shutdown(app, Some("Bearer anything")).await,
        StatusCode::UNAUTHORIZED
    );
    assert!(!handle.is_triggered());
}

#[tokio::test]
async fn shutdown_with_valid_token_is_accepted_and_triggers() {
    let state = test_state().await;
    let handle = state.shutdown.clone();
    let app = build_app(state, ShutdownAuth::new(Some(TOKEN.to_string())));

    let status = post_shutdown(app, Some(&format!("Bearer {TOKEN}"))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(handle.is_triggered());
}
