//! Handler for the standalone geocoding endpoint.

use crate::api::ApiError;
use crate::AppState;
use axum::extract::{rejection::JsonRejection, Extension, Json};
use relief_geocode::{GeocodeError, ResolvedLocation};
use serde::Deserialize;
use std::sync::Arc;

/// Request body for `POST /geocode`.
#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    #[serde(default)]
    pub description: String,
}

/// Handler for `POST /geocode`.
///
/// Runs the pipeline without touching the record store. Unlike disaster
/// creation, a description that cannot be resolved is a 404 here.
pub async fn geocode_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<GeocodeRequest>, JsonRejection>,
) -> Result<Json<ResolvedLocation>, ApiError> {
    let Json(body) = payload?;
    if body.description.trim().is_empty() {
        return Err(ApiError::BadRequest("description is required".to_string()));
    }

    match state.records.geocoder().resolve_location(&body.description).await {
        Ok(location) => Ok(Json(location)),
        Err(e @ (GeocodeError::NoLocationExtracted | GeocodeError::LocationNotResolvable(_))) => {
            Err(ApiError::NotFound(e.to_string()))
        }
        Err(e) => {
            tracing::warn!(error = %e, "geocoding service failed");
            Err(e.into())
        }
    }
}
