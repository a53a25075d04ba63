use std::sync::Arc;

use tracing::info;

use courier_db::Database;
use courier_types::api::RegisterRequest;
use courier_types::models::{Contact, ReceivedMessage, RegisteredUser, SentMessage, UserProfile};

use crate::error::{Result, StoreError};
use crate::{AuthConfig, contact_from_row, now_rfc3339, parse_opt_timestamp, parse_timestamp, password, run_blocking};

/// Credential store: owns user records, password hashing/verification and
/// login bookkeeping. Stateless over the shared database handle.
#[derive(Clone)]
pub struct UserStore {
    db: Arc<Database>,
    work_factor: u32,
    /// Verified on unknown-username logins so the miss path costs the same
    /// as a real verification.
    decoy_hash: String,
}

impl UserStore {
    pub fn new(db: Arc<Database>, config: &AuthConfig) -> Result<Self> {
        let decoy_hash = password::hash("courier-decoy", config.work_factor)?;
        Ok(Self {
            db,
            work_factor: config.work_factor,
            decoy_hash,
        })
    }

    /// Register a new user. All five fields are checked before any hashing
    /// or storage work, so a rejected request writes nothing. Duplicates are
    /// not pre-checked: the UNIQUE constraint catches them at insert time,
    /// concurrent registrations included.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisteredUser> {
        for (field, value) in [
            ("username", &req.username),
            ("password", &req.password),
            ("first_name", &req.first_name),
            ("last_name", &req.last_name),
            ("phone", &req.phone),
        ] {
            if value.is_empty() {
                return Err(StoreError::Validation(format!("{field} is required")));
            }
        }

        let db = self.db.clone();
        let work_factor = self.work_factor;
        run_blocking(move || {
            let hash = password::hash(&req.password, work_factor)?;
            let now = now_rfc3339();

            if let Err(err) = db.insert_user(
                &req.username,
                &hash,
                &req.first_name,
                &req.last_name,
                &req.phone,
                &now,
            ) {
                if courier_db::is_constraint_violation(&err) {
                    return Err(StoreError::Conflict(format!(
                        "username already taken: {}",
                        req.username
                    )));
                }
                return Err(err.into());
            }

            info!(username = %req.username, "registered user");
            Ok(RegisteredUser {
                username: req.username,
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
                password: hash,
            })
        })
        .await
    }

    /// Is this username/password pair valid? Unknown username and wrong
    /// password are indistinguishable to the caller: both come back
    /// `Ok(false)`, and the unknown path burns a verification against the
    /// decoy hash so timing matches.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        let db = self.db.clone();
        let username = username.to_string();
        let password = password.to_string();
        let decoy = self.decoy_hash.clone();
        run_blocking(move || match db.get_password_hash(&username)? {
            Some(hash) => Ok(password::verify(&password, &hash)),
            None => {
                let _ = password::verify(&password, &decoy);
                Ok(false)
            }
        })
        .await
    }

    /// Stamp `last_login_at` with the current time.
    pub async fn update_login_timestamp(&self, username: &str) -> Result<()> {
        let db = self.db.clone();
        let username = username.to_string();
        run_blocking(move || {
            if db.touch_last_login(&username, &now_rfc3339())? {
                Ok(())
            } else {
                Err(StoreError::NotFound(format!("no such user: {username}")))
            }
        })
        .await
    }

    /// Basic info on every user, ordered by username.
    pub async fn all(&self) -> Result<Vec<Contact>> {
        let db = self.db.clone();
        run_blocking(move || {
            let rows = db.list_users()?;
            Ok(rows.into_iter().map(contact_from_row).collect())
        })
        .await
    }

    /// Full public profile. The password hash never leaves the store.
    pub async fn get(&self, username: &str) -> Result<UserProfile> {
        let db = self.db.clone();
        let username = username.to_string();
        run_blocking(move || {
            let row = db
                .get_user(&username)?
                .ok_or_else(|| StoreError::NotFound(format!("no such user: {username}")))?;

            Ok(UserProfile {
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
                join_at: parse_timestamp(&row.join_at)?,
                last_login_at: parse_timestamp(&row.last_login_at)?,
            })
        })
        .await
    }

    /// Messages sent by `username`, oldest first, each with the recipient's
    /// contact info. An unknown username is `NotFound`, not an empty list.
    pub async fn messages_from(&self, username: &str) -> Result<Vec<SentMessage>> {
        let db = self.db.clone();
        let username = username.to_string();
        run_blocking(move || {
            ensure_user_exists(&db, &username)?;
            db.messages_from(&username)?
                .into_iter()
                .map(|row| {
                    Ok(SentMessage {
                        id: row.id,
                        to_user: contact_from_row(row.counterpart),
                        body: row.body,
                        sent_at: parse_timestamp(&row.sent_at)?,
                        read_at: parse_opt_timestamp(row.read_at.as_deref())?,
                    })
                })
                .collect()
        })
        .await
    }

    /// Messages received by `username`, oldest first, each with the
    /// sender's contact info. Same `NotFound` rule as `messages_from`.
    pub async fn messages_to(&self, username: &str) -> Result<Vec<ReceivedMessage>> {
        let db = self.db.clone();
        let username = username.to_string();
        run_blocking(move || {
            ensure_user_exists(&db, &username)?;
            db.messages_to(&username)?
                .into_iter()
                .map(|row| {
                    Ok(ReceivedMessage {
                        id: row.id,
                        from_user: contact_from_row(row.counterpart),
                        body: row.body,
                        sent_at: parse_timestamp(&row.sent_at)?,
                        read_at: parse_opt_timestamp(row.read_at.as_deref())?,
                    })
                })
                .collect()
        })
        .await
    }
}

fn ensure_user_exists(db: &Database, username: &str) -> Result<()> {
    if db.user_exists(username)? {
        Ok(())
    } else {
        Err(StoreError::NotFound(format!("no such user: {username}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            work_factor: 1,
            signing_secret: "test-secret".into(),
            token_ttl: None,
        }
    }

    fn store() -> UserStore {
        let db = Arc::new(Database::open_in_memory().unwrap());
        UserStore::new(db, &test_config()).unwrap()
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            password: "secret1".into(),
            first_name: "Alice".into(),
            last_name: "A".into(),
            phone: "111".into(),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let store = store();
        let created = store.register(alice()).await.unwrap();

        assert_eq!(created.username, "alice");
        assert_eq!(created.first_name, "Alice");
        assert_eq!(created.last_name, "A");
        assert_eq!(created.phone, "111");
        // stored as a hash, never the plaintext
        assert_ne!(created.password, "secret1");
        assert!(created.password.starts_with("$argon2id$"));

        assert!(store.authenticate("alice", "secret1").await.unwrap());
        assert!(!store.authenticate("alice", "wrong").await.unwrap());
        // unknown user is a plain false, not an error
        assert!(!store.authenticate("bob", "x").await.unwrap());
    }

    #[tokio::test]
    async fn register_rejects_empty_fields() {
        let store = store();
        let mut req = alice();
        req.phone = String::new();

        let err = store.register(req).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        // nothing was written
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = store();
        store.register(alice()).await.unwrap();

        let mut again = alice();
        again.first_name = "Impostor".into();
        let err = store.register(again).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // original row unchanged
        let profile = store.get("alice").await.unwrap();
        assert_eq!(profile.first_name, "Alice");
    }

    #[tokio::test]
    async fn login_timestamp_advances() {
        let store = store();
        store.register(alice()).await.unwrap();

        let before = store.get("alice").await.unwrap().last_login_at;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.update_login_timestamp("alice").await.unwrap();
        let after = store.get("alice").await.unwrap().last_login_at;
        assert!(after > before);

        let err = store.update_login_timestamp("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn join_at_is_set_once_with_last_login() {
        let store = store();
        store.register(alice()).await.unwrap();

        let profile = store.get("alice").await.unwrap();
        assert_eq!(profile.join_at, profile.last_login_at);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.update_login_timestamp("alice").await.unwrap();
        let later = store.get("alice").await.unwrap();
        assert_eq!(later.join_at, profile.join_at);
        assert!(later.last_login_at > later.join_at);
    }

    #[tokio::test]
    async fn all_is_sorted_by_username() {
        let store = store();
        for name in ["carol", "alice", "bob"] {
            let mut req = alice();
            req.username = name.into();
            store.register(req).await.unwrap();
        }

        let users: Vec<String> = store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(users, ["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn profile_never_carries_the_hash() {
        let store = store();
        store.register(alice()).await.unwrap();

        let profile = store.get("alice").await.unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password").is_none());

        let err = store.get("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn feeds_for_unknown_user_are_not_found() {
        let store = store();

        let err = store.messages_from("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = store.messages_to("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn feeds_start_empty() {
        let store = store();
        store.register(alice()).await.unwrap();

        assert!(store.messages_from("alice").await.unwrap().is_empty());
        assert!(store.messages_to("alice").await.unwrap().is_empty());
    }
}
