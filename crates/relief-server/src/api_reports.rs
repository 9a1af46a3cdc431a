//! Field report endpoints.

use crate::api::ApiError;
use crate::middleware::IdentityContext;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
};
use relief_types::{NewReport, Report, ReportPatch};
use serde::Deserialize;
use std::sync::Arc;

/// Request body for `POST /disasters/{id}/reports`.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    #[serde(default)]
    pub content: String,
    pub image_url: Option<String>,
}

/// Handler for `GET /disasters/{id}/reports`. Newest first.
pub async fn list_reports_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(disaster_id): Path<String>,
) -> Result<Json<Vec<Report>>, ApiError> {
    Ok(Json(state.records.list_reports(disaster_id).await?))
}

/// Handler for `POST /disasters/{id}/reports`.
pub async fn create_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(disaster_id): Path<String>,
    payload: Result<Json<CreateReportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let Json(body) = payload?;
    let new = NewReport {
        disaster_id,
        content: body.content,
        image_url: body.image_url.filter(|u| !u.is_empty()),
    };
    let report = state.records.create_report(new, actor).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Handler for `PUT /reports/{id}`.
pub async fn update_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(id): Path<String>,
    payload: Result<Json<ReportPatch>, JsonRejection>,
) -> Result<Json<Report>, ApiError> {
    let Json(patch) = payload?;
    Ok(Json(state.records.update_report(id, patch, actor).await?))
}

/// Handler for `DELETE /reports/{id}`.
pub async fn delete_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(IdentityContext(actor)): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.records.delete_report(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
