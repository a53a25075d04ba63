use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use courier_types::api::{Claims, MessageResponse, SendMessageRequest};

use crate::AppState;
use crate::error::ApiError;

/// POST /messages — the sender is always the token subject.
pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .messages
        .create(&claims.sub, &req.to_username, &req.body)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// GET /messages/{id} — visible to its sender and recipient only.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.messages.get(id).await?;
    if message.from_user.username != claims.sub && message.to_user.username != claims.sub {
        return Err(ApiError::Auth);
    }

    Ok(Json(MessageResponse { message }))
}

/// POST /messages/{id}/read — recipient only.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.messages.get(id).await?;
    if message.to_user.username != claims.sub {
        return Err(ApiError::Auth);
    }

    let message = state.messages.mark_read(id).await?;
    Ok(Json(MessageResponse { message }))
}
