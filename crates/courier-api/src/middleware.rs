use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::ApiError};

/// Extract and validate the bearer token, stashing the verified claims as
/// a request extension for handlers downstream.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Auth)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Auth)?;

    let claims = state.issuer.verify(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
