use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public identity fields exposed for any registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Full public profile. Deliberately has no password field, so the hash
/// cannot leak through this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// What registration hands back: the public fields plus the stored hash.
/// `password` is the Argon2id PHC string, never the plaintext.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password: String,
}

/// A message in the sender's outbox: the counterpart is the recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i64,
    pub to_user: Contact,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// A message in the recipient's inbox: the counterpart is the sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub from_user: Contact,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// A single message with both endpoints joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDetail {
    pub id: i64,
    pub from_user: Contact,
    pub to_user: Contact,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}
