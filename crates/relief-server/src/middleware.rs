use axum::{body::Body, http::Request, middleware::Next, response::Response};
use relief_types::Identity;
use std::sync::Arc;

use crate::api::ApiError;
use crate::AppState;

/// The resolved actor, stored in request extensions for protected routes.
#[derive(Clone, Debug)]
pub struct IdentityContext(pub Identity);

/// Resolves `Authorization: Bearer <handle>` against the role table.
///
/// The handle is trusted as presented; there is no signature or session.
/// A missing or non-Bearer header is a 401, an unknown handle a 403.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("app state missing".to_string()))?
        .clone();

    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = state.roles.resolve(header).inspect_err(|e| {
        tracing::debug!(path = %req.uri().path(), error = %e, "authentication rejected");
    })?;

    req.extensions_mut().insert(IdentityContext(identity));
    Ok(next.run(req).await)
}
