//! `RestClient` against an in-process stub of the ads backend.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use adpanel::{
    api::{AdminApi, DeliveryApi, RestClient},
    client::HttpClient,
    config::AppConfig,
    error::ApiError,
    loading::LoadingTracker,
    models::{AdForm, AdKind, ImageFile},
    query::{AdFilter, ClickStatsQuery, DateRange, Selection},
};
use axum::{
    extract::{Multipart, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Seen {
    queries: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    parts: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

async fn list_ads(State(seen): State<Seen>, RawQuery(query): RawQuery) -> Json<Value> {
    seen.queries.lock().unwrap().push(query.unwrap_or_default());
    Json(json!({
        "data": [{
            "id": 3, "link": "https://a.example", "is_main": true,
            "img_url": "/static/uploads/a.png", "status": "active",
            "x_redirect_enabled": false, "created_at": "2025-01-02 10:00:00"
        }]
    }))
}

async fn upload(State(seen): State<Seen>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        seen.parts.lock().unwrap().push((name, file_name));
    }
    Json(json!({ "id": 7 }))
}

async fn add_domain(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.bodies.lock().unwrap().push(body);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "detail": "domain already in blacklist" })),
    )
}

async fn clicks(State(seen): State<Seen>, RawQuery(query): RawQuery) -> Json<Value> {
    seen.queries.lock().unwrap().push(query.unwrap_or_default());
    Json(json!({
        "data": [{"domain": "blog.example", "ip": "203.0.113.1", "clicks": 4, "day": "2025-01-05"}],
        "pagination": {"page": 2, "page_size": 5, "total_items": 11}
    }))
}

async fn random_pair(State(seen): State<Seen>, RawQuery(query): RawQuery) -> Json<Value> {
    seen.queries.lock().unwrap().push(query.unwrap_or_default());
    Json(json!({
        "code": 200,
        "msg": "success",
        "data": {"main": null, "secondary": null}
    }))
}

async fn click(State(seen): State<Seen>, Json(body): Json<Value>) -> StatusCode {
    seen.bodies.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}

async fn spawn_backend() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/ads", get(list_ads))
        .route("/ads/upload", post(upload))
        .route("/ads/settings", get(broken))
        .route("/ads/random_pair", get(random_pair))
        .route("/events/click", post(click))
        .route("/domains/blacklist", post(add_domain))
        .route("/stats/clicks/by_domain_ip", get(clicks))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn client(addr: SocketAddr, loading: LoadingTracker) -> RestClient {
    let mut config = AppConfig::with_base_url(format!("http://{addr}/"));
    config.loading_min_duration = Duration::from_secs(60);
    RestClient::new(HttpClient::new(&config, loading).unwrap())
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn unconstrained_filters_are_left_out_of_the_query() {
    let (addr, seen) = spawn_backend().await;
    let api = client(addr, LoadingTracker::new());

    let filter = AdFilter {
        kind: Selection::Only(AdKind::Main),
        ..Default::default()
    };
    let ads = api.list_ads(&filter).await.unwrap();
    assert_eq!(ads.len(), 1);
    assert_eq!(ads[0].kind(), AdKind::Main);

    api.list_ads(&AdFilter::default()).await.unwrap();
    assert_eq!(*seen.queries.lock().unwrap(), ["type=main", ""]);
}

#[tokio::test]
async fn create_uploads_a_multipart_form() {
    let (addr, seen) = spawn_backend().await;
    let api = client(addr, LoadingTracker::new());

    let form = AdForm {
        link: "https://advertiser.example".into(),
        kind: AdKind::Secondary,
        x_redirect_enabled: true,
        image: Some(ImageFile {
            file_name: "banner.png".into(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }),
    };
    let created = api.create_ad(&form).await.unwrap();
    assert_eq!(created.id, 7);

    let parts = seen.parts.lock().unwrap().clone();
    let names: Vec<&str> = parts.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["link", "is_main", "x_redirect_enabled", "file"]);
    assert_eq!(parts[3].1.as_deref(), Some("banner.png"));
}

#[tokio::test]
async fn create_without_image_never_reaches_the_backend() {
    let (addr, seen) = spawn_backend().await;
    let api = client(addr, LoadingTracker::new());

    let form = AdForm {
        link: "https://advertiser.example".into(),
        kind: AdKind::Main,
        x_redirect_enabled: false,
        image: None,
    };
    let err = api.create_ad(&form).await.unwrap_err();
    assert!(matches!(err, ApiError::Invalid(_)));
    assert!(seen.parts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn error_detail_is_surfaced_and_loading_released() {
    let (addr, seen) = spawn_backend().await;
    let loading = LoadingTracker::new();
    let api = client(addr, loading.clone());

    let err = api.add_to_blacklist("  spam.example ").await.unwrap_err();
    match &err {
        ApiError::Status { status, detail } => {
            assert_eq!(*status, reqwest::StatusCode::BAD_REQUEST);
            assert_eq!(detail, "domain already in blacklist");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(seen.bodies.lock().unwrap()[0], json!({"domain": "spam.example"}));

    assert_eq!(loading.active("domains"), 0);
    // Still inside the minimum visible window
    assert!(loading.is_loading("domains"));
    assert!(!loading.is_loading("global"));
}

#[tokio::test]
async fn empty_error_body_falls_back_to_reason_phrase() {
    let (addr, _) = spawn_backend().await;
    let api = client(addr, LoadingTracker::new());

    let err = api.ad_settings().await.unwrap_err();
    assert_eq!(err.notice(), "Internal Server Error");
}

#[tokio::test]
async fn pagination_comes_back_verbatim() {
    let (addr, seen) = spawn_backend().await;
    let api = client(addr, LoadingTracker::new());

    let query = ClickStatsQuery {
        range: DateRange::new(day("2025-01-01"), day("2025-01-31")),
        kind: AdKind::Secondary,
        page: 2,
        page_size: 5,
    };
    let page = api.clicks_by_domain_ip(&query).await.unwrap();
    assert_eq!(page.pagination.total_items, 11);
    assert_eq!(page.data[0].clicks, 4);
    assert_eq!(
        seen.queries.lock().unwrap()[0],
        "start=2025-01-01&end=2025-01-31&type=secondary&page=2&page_size=5"
    );
}

#[tokio::test]
async fn delivery_calls_are_silent() {
    let (addr, seen) = spawn_backend().await;
    let loading = LoadingTracker::new();
    let api = client(addr, loading.clone());

    let resp = api.random_pair(Some("blog.example")).await.unwrap();
    assert_eq!(resp.code, 200);
    api.record_click(3, "blog.example").await.unwrap();

    assert_eq!(seen.queries.lock().unwrap()[0], "domain=blog.example");
    assert_eq!(
        seen.bodies.lock().unwrap()[0],
        json!({"ad_id": 3, "domain": "blog.example"})
    );
    assert!(!loading.is_loading("global"));
    assert_eq!(api.asset_url("/static/a.png"), format!("http://{addr}/static/a.png"));
}
