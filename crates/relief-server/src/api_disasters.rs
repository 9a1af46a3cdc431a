//! Disaster endpoints.

use crate::api::ApiError;
use crate::middleware::IdentityContext;
use crate::service::DisasterDraft;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path, Query},
    http::StatusCode,
};
use relief_types::{Disaster, DisasterPatch};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Query parameters for `GET /disasters`.
#[derive(Debug, Deserialize)]
pub struct ListDisastersQuery {
    /// Only return disasters carrying this tag.
    pub tag: Option<String>,
}

/// Request body for `POST /disasters`.
///
/// Missing strings deserialize as empty and are rejected by validation
/// with the field name.
#[derive(Debug, Deserialize)]
pub struct CreateDisasterRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Handler for `GET /disasters`.
pub async fn list_disasters_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ListDisastersQuery>,
) -> Result<Json<Vec<Disaster>>, ApiError> {
    let tag = query.tag.filter(|t| !t.is_empty());
    Ok(Json(state.records.list_disasters(tag).await?))
}

/// Handler for `GET /disasters/{id}`.
pub async fn get_disaster_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Disaster>, ApiError> {
    Ok(Json(state.records.get_disaster(id).await?))
}

/// Handler for `POST /disasters`.
pub async fn create_disaster_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    payload: Result<Json<CreateDisasterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Disaster>), ApiError> {
    let Json(body) = payload?;
    let draft = DisasterDraft {
        title: body.title,
        description: body.description,
        tags: body.tags,
    };
    let disaster = state.records.create_disaster(draft, actor).await?;
    Ok((StatusCode::CREATED, Json(disaster)))
}

/// Handler for `PUT /disasters/{id}`.
pub async fn update_disaster_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(id): Path<String>,
    payload: Result<Json<DisasterPatch>, JsonRejection>,
) -> Result<Json<Disaster>, ApiError> {
    let Json(patch) = payload?;
    Ok(Json(state.records.update_disaster(id, patch, actor).await?))
}

/// Handler for `DELETE /disasters/{id}`.
pub async fn delete_disaster_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.records.delete_disaster(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `DELETE /disasters/all`. Admin only.
pub async fn delete_all_disasters_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
) -> Result<StatusCode, ApiError> {
    state.records.delete_all_disasters(actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
