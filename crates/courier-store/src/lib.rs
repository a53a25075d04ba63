pub mod error;
pub mod messages;
pub mod password;
pub mod token;
pub mod users;

pub use error::StoreError;
pub use messages::MessageStore;
pub use token::SessionIssuer;
pub use users::UserStore;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use courier_db::models::ContactRow;
use courier_types::models::Contact;

use crate::error::Result;

/// Process-wide auth settings, assembled once at startup and handed to the
/// stores at construction.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Argon2 iteration cost. Higher is slower and harder to brute-force.
    pub work_factor: u32,
    /// HMAC key for session tokens.
    pub signing_secret: String,
    /// Token lifetime. `None` issues tokens without an expiry claim.
    pub token_ttl: Option<Duration>,
}

/// Timestamps are written by the process clock, not the database, at fixed
/// microsecond width so lexical and chronological order agree.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| StoreError::Storage(anyhow::anyhow!("corrupt timestamp '{raw}': {e}")))
}

pub(crate) fn parse_opt_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_timestamp).transpose()
}

pub(crate) fn contact_from_row(row: ContactRow) -> Contact {
    Contact {
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
    }
}

/// Hashing and SQLite access are blocking; they run on the blocking pool so
/// a slow hash never stalls other in-flight requests.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Storage(anyhow::anyhow!("blocking task failed: {e}")))?
}
