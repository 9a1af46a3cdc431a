//! Resource endpoints.

use crate::api::ApiError;
use crate::middleware::IdentityContext;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
};
use relief_types::{Coordinates, NewResource, Resource, ResourcePatch};
use serde::Deserialize;
use std::sync::Arc;

/// Request body for `POST /disasters/{id}/resources`.
#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub name: Option<String>,
    pub location_name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Handler for `GET /disasters/{id}/resources`.
pub async fn list_resources_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(disaster_id): Path<String>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(state.records.list_resources(disaster_id).await?))
}

/// Handler for `POST /disasters/{id}/resources`.
pub async fn create_resource_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(disaster_id): Path<String>,
    payload: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let Json(body) = payload?;
    let name = body.name.filter(|n| !n.trim().is_empty());
    let (Some(name), Some(lat), Some(lon)) = (name, body.lat, body.lon) else {
        return Err(ApiError::BadRequest(
            "name, lat, and lon are required".to_string(),
        ));
    };

    let new = NewResource {
        disaster_id,
        name,
        location_name: body.location_name,
        resource_type: body.resource_type,
        coordinates: Coordinates::new(lat, lon),
    };
    let resource = state.records.create_resource(new, actor).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

/// Handler for `PUT /resources/{id}`.
pub async fn update_resource_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(id): Path<String>,
    payload: Result<Json<ResourcePatch>, JsonRejection>,
) -> Result<Json<Resource>, ApiError> {
    let Json(patch) = payload?;
    Ok(Json(state.records.update_resource(id, patch, actor).await?))
}

/// Handler for `DELETE /resources/{id}`.
pub async fn delete_resource_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.records.delete_resource(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
