use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use courier_types::api::{LoginRequest, RegisterRequest, TokenResponse};

use crate::AppState;
use crate::error::ApiError;

/// POST /register — create the user and log them in. Registration sets
/// both timestamps at creation, so no extra login-stamp call here.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.users.register(req).await?;
    let token = state.issuer.issue(&created.username)?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// POST /login — verify credentials, stamp the login, issue a token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.users.authenticate(&req.username, &req.password).await? {
        return Err(ApiError::Auth);
    }

    state.users.update_login_timestamp(&req.username).await?;
    let token = state.issuer.issue(&req.username)?;

    Ok(Json(TokenResponse { token }))
}
