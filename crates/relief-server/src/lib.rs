//! Relief server library logic.

pub mod api;
pub mod api_disasters;
pub mod api_feeds;
pub mod api_geocode;
pub mod api_reports;
pub mod api_resources;
pub mod api_sse;
pub mod api_ws;
pub mod config;
pub mod hub;
pub mod locks;
pub mod middleware;
pub mod service;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use hub::Hub;
use relief_identity::RoleTable;
use serde_json::{json, Value};
use service::RecordService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Known actors and their roles.
    pub roles: Arc<RoleTable>,
    /// Mutation path: per-entity locks, store, fan-out.
    pub records: RecordService,
    /// Observer fan-out hub. Same hub the record service publishes to.
    pub hub: Hub,
    /// Browser origins allowed by CORS. Empty allows any.
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(roles: RoleTable, records: RecordService, cors_origins: Vec<String>) -> Self {
        Self {
            roles: Arc::new(roles),
            hub: records.hub().clone(),
            records,
            cors_origins,
        }
    }
}

/// Maximum request body size (256 KiB).
const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/disasters", post(api_disasters::create_disaster_handler))
        .route(
            "/disasters/all",
            delete(api_disasters::delete_all_disasters_handler),
        )
        .route(
            "/disasters/{id}",
            put(api_disasters::update_disaster_handler)
                .delete(api_disasters::delete_disaster_handler),
        )
        .route(
            "/disasters/{id}/resources",
            post(api_resources::create_resource_handler),
        )
        .route(
            "/resources/{id}",
            put(api_resources::update_resource_handler)
                .delete(api_resources::delete_resource_handler),
        )
        .route(
            "/disasters/{id}/reports",
            post(api_reports::create_report_handler),
        )
        .route(
            "/reports/{id}",
            put(api_reports::update_report_handler).delete(api_reports::delete_report_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/disasters", get(api_disasters::list_disasters_handler))
        .route("/disasters/{id}", get(api_disasters::get_disaster_handler))
        .route(
            "/disasters/{id}/resources",
            get(api_resources::list_resources_handler),
        )
        .route(
            "/disasters/{id}/reports",
            get(api_reports::list_reports_handler),
        )
        .route("/geocode", post(api_geocode::geocode_handler))
        .route("/verify", post(api_feeds::verify_image_handler))
        .route("/official", get(api_feeds::official_updates_handler))
        .route(
            "/social/{disaster_id}",
            get(api_feeds::social_feed_handler),
        )
        .route("/events/stream", get(api_sse::event_stream_handler))
        .route("/ws", get(api_ws::ws_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}
