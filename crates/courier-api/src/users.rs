use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use courier_types::api::{
    Claims, ReceivedMessagesResponse, SentMessagesResponse, UserResponse, UsersResponse,
};

use crate::AppState;
use crate::error::ApiError;

/// GET /users — basic info on every registered user.
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.all().await?;
    Ok(Json(UsersResponse { users }))
}

/// GET /users/{username} — full public profile.
pub async fn get(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get(&username).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/{username}/messages/from — the user's own outbox only.
pub async fn messages_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self(&claims, &username)?;
    let messages = state.users.messages_from(&username).await?;
    Ok(Json(SentMessagesResponse { messages }))
}

/// GET /users/{username}/messages/to — the user's own inbox only.
pub async fn messages_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_self(&claims, &username)?;
    let messages = state.users.messages_to(&username).await?;
    Ok(Json(ReceivedMessagesResponse { messages }))
}

/// Feeds are readable only by their owner; anyone else gets the same
/// response as a bad token.
fn ensure_self(claims: &Claims, username: &str) -> Result<(), ApiError> {
    if claims.sub == username {
        Ok(())
    } else {
        Err(ApiError::Auth)
    }
}
