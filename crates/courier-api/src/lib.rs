pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod users;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use courier_store::{MessageStore, SessionIssuer, UserStore};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserStore,
    pub messages: MessageStore,
    pub issuer: SessionIssuer,
}

/// Assemble the full route tree over the shared state.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/users", get(users::list))
        .route("/users/{username}", get(users::get))
        .route("/users/{username}/messages/from", get(users::messages_from))
        .route("/users/{username}/messages/to", get(users::messages_to))
        .route("/messages", post(messages::send))
        .route("/messages/{id}", get(messages::get))
        .route("/messages/{id}/read", post(messages::mark_read))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
