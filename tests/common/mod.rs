#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, Response};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use clinic_queue_server::clock::ManualClock;
use clinic_queue_server::config::Config;
use clinic_queue_server::models::Employee;
use clinic_queue_server::queue::{QueueCounter, QueueService};
use clinic_queue_server::routes::create_routes;
use clinic_queue_server::state::AppState;
use clinic_queue_server::store::{MemoryStore, Roster};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub service: Arc<QueueService>,
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

pub fn employee(emp_id: &str, name: &str) -> Employee {
    Employee {
        emp_id: emp_id.to_string(),
        name: name.to_string(),
        gender: "Male".to_string(),
        department: "Operations".to_string(),
        mobile: "Not provided".to_string(),
    }
}

/// Router over an in-memory store with `100200` and `100300` on the roster.
pub async fn build_test_app(now: DateTime<Utc>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store.add(&employee("100200", "Ahmad Fauzi")).await.unwrap();
    store.add(&employee("100300", "Dewi Lestari")).await.unwrap();

    let clock = Arc::new(ManualClock::new(now));
    let service = Arc::new(QueueService::new(
        store.clone(),
        store.clone(),
        clock.clone(),
        QueueCounter::default(),
    ));

    let router = create_routes(
        AppState {
            service: service.clone(),
        },
        &Config::default(),
    );

    TestApp {
        router,
        store,
        clock,
        service,
    }
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &TestApp, uri: &str, json: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_raw(app: &TestApp, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn post_empty(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
