//! Integration tests for flyer-tours API endpoints
//!
//! Each test runs against a fresh in-memory database through the full
//! router, including the auth middleware.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

use flyer_tours::scheduler::{ValidationSchedule, ValidationService};
use flyer_tours::store::SqliteStore;
use flyer_tours::{build_router, AppState};

/// Test helper: Create app over an empty in-memory database
async fn setup_app(api_secret: Option<&str>) -> axum::Router {
    let pool = flyer_common::db::init_in_memory()
        .await
        .expect("Should create in-memory database");
    let store = Arc::new(SqliteStore::new(pool));
    let validation = Arc::new(ValidationService::new(
        ValidationSchedule::default(),
        store.clone(),
    ));
    build_router(AppState::new(
        store,
        validation,
        api_secret.map(str::to_string),
    ))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn signup(user: &str, city: &str, start: &str, sectors: &[&str]) -> Value {
    json!({
        "user_id": user,
        "city": city,
        "start_date": start,
        "total_dwellings": 500,
        "distribution_cost": 40.0,
        "sectors": sectors
            .iter()
            .map(|code| json!({ "code": code, "name": format!("Quartier {}", code) }))
            .collect::<Vec<_>>(),
    })
}

/// Register a participation and return its id
async fn register(app: &axum::Router, body: Value) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/participations", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = extract_json(response.into_body()).await;
    json["participation"]["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth() {
    let app = setup_app(Some("secret")).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "flyer-tours");
    assert_eq!(json["validation_enabled"], true);
    assert!(json["last_batch_at"].is_null());
}

// =============================================================================
// Participations
// =============================================================================

#[tokio::test]
async fn test_create_and_get_participation() {
    let app = setup_app(None).await;
    let id = register(&app, signup("user-1", "Lyon", "15 janvier 2024", &["69001", "69002"])).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/participations/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["participation"]["status"], "pending");
    assert_eq!(json["participation"]["start_date"], "15 janvier 2024");
    assert_eq!(json["sectors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_participation_rejects_bad_date() {
    let app = setup_app(None).await;

    let response = app
        .oneshot(post_json(
            "/api/participations",
            signup("user-1", "Lyon", "2024-01-15", &["69001"]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_unknown_participation_is_404() {
    let app = setup_app(None).await;

    let response = app
        .oneshot(get("/api/participations/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let app = setup_app(None).await;
    let id = register(&app, signup("user-1", "Lyon", "15 janvier 2024", &["69001"])).await;
    let uri = format!("/api/participations/{}/cancel", id);

    let first = app.clone().oneshot(post_json(&uri, json!({}))).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let json = extract_json(first.into_body()).await;
    assert_eq!(json["outcome"], "cancelled");
    assert_eq!(json["status"], "cancelled");

    let second = app.clone().oneshot(post_json(&uri, json!({}))).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let json = extract_json(second.into_body()).await;
    assert_eq!(json["outcome"], "already_cancelled");

    let missing = app
        .oneshot(post_json(
            "/api/participations/00000000-0000-0000-0000-000000000000/cancel",
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Validation batch
// =============================================================================

#[tokio::test]
async fn test_validation_run_commits_bouclee_tour() {
    let app = setup_app(None).await;
    let mut ids = Vec::new();
    for n in 0..5 {
        ids.push(
            register(
                &app,
                signup(&format!("user-{}", n), "Lyon", "15 janvier 2024", &["69001"]),
            )
            .await,
        );
    }

    // Commit date of 15 janvier 2024 is 2023-12-31
    let response = app
        .clone()
        .oneshot(post_json("/api/validation/run", json!({ "date": "2023-12-31" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let summary = extract_json(response.into_body()).await;
    assert_eq!(summary["evaluation_date"], "2023-12-31");
    assert_eq!(summary["tours_validated"], 1);
    assert_eq!(summary["tours"][0]["status"], "bouclee");
    assert_eq!(summary["tours"][0]["participations_updated"], 5);

    for id in &ids {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/participations/{}", id)))
            .await
            .unwrap();
        let json = extract_json(response.into_body()).await;
        assert_eq!(json["participation"]["status"], "bouclee");
    }

    let response = app.clone().oneshot(get("/api/validation/history")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = extract_json(response.into_body()).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let response = app.oneshot(get("/health")).await.unwrap();
    let health = extract_json(response.into_body()).await;
    assert_eq!(health["last_evaluation_date"], "2023-12-31");
    assert_eq!(health["last_batch_failures"], 0);
    assert!(health["last_batch_at"].is_string());
}

#[tokio::test]
async fn test_validation_run_outside_window_writes_nothing() {
    let app = setup_app(None).await;
    let id = register(&app, signup("user-1", "Lyon", "15 janvier 2024", &["69001"])).await;

    let response = app
        .clone()
        .oneshot(post_json("/api/validation/run", json!({ "date": "2023-12-20" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = extract_json(response.into_body()).await;
    assert_eq!(summary["tours_validated"], 0);
    assert_eq!(summary["tours_skipped"], 1);

    let response = app
        .oneshot(get(&format!("/api/participations/{}", id)))
        .await
        .unwrap();
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["participation"]["status"], "pending");
}

#[tokio::test]
async fn test_validation_run_rejects_bad_date() {
    let app = setup_app(None).await;

    let response = app
        .oneshot(post_json("/api/validation/run", json!({ "date": "31/12/2023" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_run_rejects_unusable_body() {
    let app = setup_app(None).await;

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/api/validation/run")
        .body(Body::from(r#"{"date":"2023-12-31"}"#))
        .unwrap();
    let mistyped = post_json("/api/validation/run", json!({ "date": 20231231 }));
    let truncated = Request::builder()
        .method("POST")
        .uri("/api/validation/run")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"date":"2023-12-31""#))
        .unwrap();

    for request in [no_content_type, mistyped, truncated] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Nothing ran
    let response = app.oneshot(get("/api/validation/history")).await.unwrap();
    let history = extract_json(response.into_body()).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_run_without_body_uses_today() {
    let app = setup_app(None).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/validation/run")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let summary = extract_json(response.into_body()).await;
    assert_eq!(
        summary["evaluation_date"],
        flyer_common::time::today().to_string()
    );
}

#[tokio::test]
async fn test_create_participation_rejects_out_of_range_year() {
    let app = setup_app(None).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/participations",
            signup("user-1", "Lyon", "5 janvier 9999999", &["69001"]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "DATE_OUT_OF_RANGE");

    let response = app
        .oneshot(post_json(
            "/api/participations",
            signup("user-1", "Lyon", "5 janvier -262143", &["69001"]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_secret() {
    let app = setup_app(Some("s3cret")).await;

    let response = app
        .clone()
        .oneshot(post_json("/api/validation/run", json!({ "date": "2023-12-31" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .method("GET")
        .uri("/api/validation/history")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .method("GET")
        .uri("/api/validation/history")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(right).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Portal routes stay public
    let response = app.oneshot(get("/api/cities")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Dashboard and tours
// =============================================================================

#[tokio::test]
async fn test_dashboard_projects_bouclee_before_commit() {
    let app = setup_app(None).await;
    for n in 0..5 {
        register(
            &app,
            signup(&format!("user-{}", n), "Lyon", "15 janvier 2024", &["69001"]),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get("/api/users/user-0/dashboard?date=2023-12-01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    let entry = &json["participations"][0];
    assert_eq!(entry["participation"]["status"], "pending");
    assert_eq!(entry["displayed_status"], "bouclee");
    assert_eq!(entry["phase"], "before_commit");
    assert_eq!(entry["tour_sectors"][0]["count"], 5);

    // Dashboard reads never write
    let response = app
        .oneshot(get("/api/users/user-0/dashboard?date=2023-12-01"))
        .await
        .unwrap();
    let json = extract_json(response.into_body()).await;
    assert_eq!(json["participations"][0]["participation"]["status"], "pending");
}

#[tokio::test]
async fn test_dashboard_shows_cancelled_participation() {
    let app = setup_app(None).await;
    let id = register(&app, signup("user-1", "Lyon", "15 janvier 2024", &["69001"])).await;
    app.clone()
        .oneshot(post_json(&format!("/api/participations/{}/cancel", id), json!({})))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/users/user-1/dashboard?date=2023-12-01"))
        .await
        .unwrap();
    let json = extract_json(response.into_body()).await;
    let entry = &json["participations"][0];
    assert_eq!(entry["displayed_status"], "cancelled");
    assert!(entry["phase"].is_null());
}

#[tokio::test]
async fn test_dashboard_rejects_bad_date() {
    let app = setup_app(None).await;

    let response = app
        .oneshot(get("/api/users/user-1/dashboard?date=tomorrow"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tours_and_cities_listing() {
    let app = setup_app(None).await;
    register(&app, signup("user-1", "Lyon", "15 janvier 2024", &["69001"])).await;
    register(&app, signup("user-2", "Lyon", "15 janvier 2024", &["69001"])).await;
    register(&app, signup("user-3", "Nantes", "3 mars 2024", &["44109"])).await;

    let response = app.clone().oneshot(get("/api/cities")).await.unwrap();
    let cities = extract_json(response.into_body()).await;
    assert_eq!(cities, json!(["Lyon", "Nantes"]));

    let response = app
        .oneshot(get("/api/tours?city=Lyon&date=2023-12-01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = extract_json(response.into_body()).await;
    let tours = json["tours"].as_array().unwrap();
    assert_eq!(tours.len(), 1);
    assert_eq!(tours[0]["city"], "Lyon");
    assert_eq!(tours[0]["participants"], 2);
    assert_eq!(tours[0]["phase"], "before_commit");
    assert_eq!(tours[0]["status"], "pending");
}
