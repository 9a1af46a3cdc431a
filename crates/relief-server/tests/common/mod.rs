#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use relief_geocode::{GeocodeError, GeocodingPipeline, GeocodingService, HeuristicPlaceExtractor};
use relief_identity::RoleTable;
use relief_server::hub::Hub;
use relief_server::service::RecordService;
use relief_server::AppState;
use relief_types::Coordinates;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const RIVERDALE: Coordinates = Coordinates {
    lat: 40.8901,
    lon: -73.9126,
};

/// Resolves every place to Riverdale except "Atlantis", which has no match.
pub struct FakeGeocoder;

#[async_trait]
impl GeocodingService for FakeGeocoder {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<Coordinates>, GeocodeError> {
        match query {
            "Atlantis" => Ok(Vec::new()),
            "Nowhere" => Err(GeocodeError::Upstream("geocoder returned HTTP 503".into())),
            _ => Ok(vec![RIVERDALE]),
        }
    }
}

/// App state over a fresh file-backed database with the demo role table.
///
/// Keep the returned directory alive for the duration of the test.
pub fn test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relief.db");
    let pool = relief_db::create_pool(
        path.to_str().unwrap(),
        relief_db::DbRuntimeSettings::default(),
    )
    .unwrap();
    relief_db::run_migrations(&pool.get().unwrap()).unwrap();

    let geocoder = GeocodingPipeline::new(
        Arc::new(HeuristicPlaceExtractor),
        Arc::new(FakeGeocoder),
        Duration::from_secs(2),
    );
    let records = RecordService::new(pool, Hub::new(64), geocoder);
    let state = AppState::new(RoleTable::demo(), records, Vec::new());
    (state, dir)
}

/// Sends one request through the router and returns status plus JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(handle) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {handle}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Creates a disaster through the API as `handle` and returns its id.
pub async fn create_disaster(app: &Router, handle: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/disasters",
        Some(handle),
        Some(serde_json::json!({
            "title": title,
            "description": "Flooding reported in Riverdale",
            "tags": ["flood"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}
