//! REST API tests against an in-memory store, via tower's oneshot.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use server_core::server::{build_app, AppState};

use job_scraper::pipeline::canonicalize;
use job_scraper::runner::ScrapeRunner;
use job_scraper::salary::SalaryUnit;
use job_scraper::storage::sqlite::MIGRATOR;
use job_scraper::storage::{JobStore, SqliteJobStore};
use job_scraper::types::{Job, RawJob};

async fn test_state() -> AppState {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    let store = Arc::new(SqliteJobStore::new(pool));
    let runner = Arc::new(ScrapeRunner::new(store.clone(), Vec::new()));
    AppState {
        store,
        runner,
        scrape_token: "secret".to_string(),
    }
}

fn sample_job(source_id: &str, title: &str, salary: Option<(f64, f64)>) -> Job {
    let (salary_min, salary_max) = match salary {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };
    canonicalize(RawJob {
        source: "remoteok",
        source_id: source_id.to_string(),
        title: title.to_string(),
        company: "Acme".to_string(),
        url: format!("https://remoteok.com/remote-jobs/{}", source_id),
        salary_min,
        salary_max,
        salary_unit: SalaryUnit::Annual,
        ..Default::default()
    })
    .unwrap()
}

async fn get_json(
    state: AppState,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let app = build_app(state);
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get_json(test_state().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn jobs_listing_is_empty_without_data() {
    let (status, body) = get_json(test_state().await, "/api/jobs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn jobs_listing_applies_filters() {
    let state = test_state().await;
    state
        .store
        .upsert_job(&sample_job("1", "Email Support Agent", None))
        .await
        .unwrap();
    state
        .store
        .upsert_job(&sample_job("2", "Backend Developer", Some((90_000.0, 120_000.0))))
        .await
        .unwrap();

    let (status, body) = get_json(state.clone(), "/api/jobs?category=support").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["jobs"][0]["title"], "Email Support Agent");

    let (status, body) = get_json(state.clone(), "/api/jobs?has_salary=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs"][0]["title"], "Backend Developer");

    let (status, body) = get_json(state.clone(), "/api/jobs?no_phone=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["jobs"][0]["title"], "Email Support Agent");

    let (status, _) = get_json(state, "/api/jobs?category=gardening").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn jobs_listing_supports_search() {
    let state = test_state().await;
    state
        .store
        .upsert_job(&sample_job("1", "Chat Moderator", None))
        .await
        .unwrap();

    let (status, body) = get_json(state, "/api/jobs?search=Moderator").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn job_by_id_and_not_found() {
    let state = test_state().await;
    let job = sample_job("1", "Email Support Agent", None);
    state.store.upsert_job(&job).await.unwrap();

    let uri = format!("/api/jobs/{}", job.id);
    let (status, body) = get_json(state.clone(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], job.id.as_str());

    let (status, _) = get_json(state, "/api/jobs/ffffffffffffffff").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_and_categories_and_sources() {
    let state = test_state().await;
    state
        .store
        .upsert_job(&sample_job("1", "Email Support Agent", None))
        .await
        .unwrap();

    let (status, body) = get_json(state.clone(), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_jobs"], 1);
    assert_eq!(body["no_phone_jobs"], 1);

    let (status, body) = get_json(state.clone(), "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"][0]["name"], "support");

    let (status, body) = get_json(state, "/api/sources").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"][0]["name"], "remoteok");
    assert_eq!(body["sources"][0]["count"], 1);
}

#[tokio::test]
async fn no_phone_feed_returns_curated_jobs() {
    let state = test_state().await;
    state
        .store
        .upsert_job(&sample_job("1", "Email Support Agent", None))
        .await
        .unwrap();
    state
        .store
        .upsert_job(&sample_job("2", "Backend Developer", None))
        .await
        .unwrap();

    let (status, body) = get_json(state, "/api/no-phone-feed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["jobs"][0]["title"], "Email Support Agent");
}

#[tokio::test]
async fn scrape_endpoint_validates_token_and_source() {
    let state = test_state().await;

    let app = build_app(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/scrape?token=wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = build_app(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/scrape?token=secret&source=nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No sources configured: an empty but successful run.
    let app = build_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/scrape?token=secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
