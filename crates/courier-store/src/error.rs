use thiserror::Error;

/// Error kinds surfaced by the credential and message stores. All are
/// terminal for the current request; the HTTP layer owns the mapping to
/// status codes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or empty required field. Caller's fault, no retry.
    #[error("{0}")]
    Validation(String),

    /// Duplicate unique key.
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity absent.
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials or a bad token. Carries no detail about which
    /// check failed.
    #[error("invalid credentials")]
    Auth,

    /// Storage-layer failure. Opaque to callers; nothing is retried.
    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Storage(err)
    }
}
