use std::sync::Arc;

use courier_db::Database;
use courier_types::models::MessageDetail;

use crate::error::{Result, StoreError};
use crate::{contact_from_row, now_rfc3339, parse_opt_timestamp, parse_timestamp, run_blocking};

/// Message model: directed messages between registered users. Rows are
/// immutable except for the one-shot read receipt.
#[derive(Clone)]
pub struct MessageStore {
    db: Arc<Database>,
}

impl MessageStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a message. The recipient must exist; the sender comes from a
    /// verified token, but a foreign-key failure still surfaces as absent.
    pub async fn create(
        &self,
        from_username: &str,
        to_username: &str,
        body: &str,
    ) -> Result<MessageDetail> {
        if body.is_empty() {
            return Err(StoreError::Validation("body is required".into()));
        }

        let db = self.db.clone();
        let from = from_username.to_string();
        let to = to_username.to_string();
        let body = body.to_string();
        run_blocking(move || {
            if !db.user_exists(&to)? {
                return Err(StoreError::NotFound(format!("no such user: {to}")));
            }

            let id = match db.insert_message(&from, &to, &body, &now_rfc3339()) {
                Ok(id) => id,
                Err(err) if courier_db::is_constraint_violation(&err) => {
                    return Err(StoreError::NotFound(format!("no such user: {from}")));
                }
                Err(err) => return Err(err.into()),
            };

            fetch_message(&db, id)
        })
        .await
    }

    /// Fetch one message with both endpoints joined.
    pub async fn get(&self, id: i64) -> Result<MessageDetail> {
        let db = self.db.clone();
        run_blocking(move || fetch_message(&db, id)).await
    }

    /// Record the read receipt. The transition happens at most once:
    /// marking an already-read message leaves the original timestamp.
    pub async fn mark_read(&self, id: i64) -> Result<MessageDetail> {
        let db = self.db.clone();
        run_blocking(move || {
            db.mark_message_read(id, &now_rfc3339())?;
            fetch_message(&db, id)
        })
        .await
    }
}

fn fetch_message(db: &Database, id: i64) -> Result<MessageDetail> {
    let row = db
        .get_message(id)?
        .ok_or_else(|| StoreError::NotFound(format!("no such message: {id}")))?;

    Ok(MessageDetail {
        id: row.id,
        from_user: contact_from_row(row.from_user),
        to_user: contact_from_row(row.to_user),
        body: row.body,
        sent_at: parse_timestamp(&row.sent_at)?,
        read_at: parse_opt_timestamp(row.read_at.as_deref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthConfig;
    use crate::users::UserStore;
    use courier_types::api::RegisterRequest;

    fn config() -> AuthConfig {
        AuthConfig {
            work_factor: 1,
            signing_secret: "test-secret".into(),
            token_ttl: None,
        }
    }

    async fn stores_with(usernames: &[&str]) -> (UserStore, MessageStore) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let users = UserStore::new(db.clone(), &config()).unwrap();
        let messages = MessageStore::new(db);

        for name in usernames {
            users
                .register(RegisterRequest {
                    username: name.to_string(),
                    password: "secret1".into(),
                    first_name: name.to_uppercase(),
                    last_name: "Test".into(),
                    phone: "555".into(),
                })
                .await
                .unwrap();
        }

        (users, messages)
    }

    #[tokio::test]
    async fn send_shows_up_in_both_feeds() {
        let (users, messages) = stores_with(&["alice", "bob"]).await;

        assert!(users.messages_from("alice").await.unwrap().is_empty());

        let sent = messages.create("alice", "bob", "hi bob").await.unwrap();
        assert_eq!(sent.from_user.username, "alice");
        assert_eq!(sent.to_user.username, "bob");
        assert_eq!(sent.body, "hi bob");
        assert!(sent.read_at.is_none());

        let outbox = users.messages_from("alice").await.unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].id, sent.id);
        assert_eq!(outbox[0].to_user.username, "bob");
        assert_eq!(outbox[0].body, "hi bob");
        assert_eq!(outbox[0].sent_at, sent.sent_at);
        assert!(outbox[0].read_at.is_none());

        let inbox = users.messages_to("bob").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].from_user.username, "alice");
    }

    #[tokio::test]
    async fn feeds_are_ordered_oldest_first() {
        let (users, messages) = stores_with(&["alice", "bob"]).await;

        for body in ["one", "two", "three"] {
            messages.create("alice", "bob", body).await.unwrap();
        }

        let bodies: Vec<String> = users
            .messages_from("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn empty_body_rejected() {
        let (_, messages) = stores_with(&["alice", "bob"]).await;

        let err = messages.create("alice", "bob", "").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_recipient_rejected() {
        let (_, messages) = stores_with(&["alice"]).await;

        let err = messages.create("alice", "ghost", "hello?").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn mark_read_is_one_shot() {
        let (_, messages) = stores_with(&["alice", "bob"]).await;
        let sent = messages.create("alice", "bob", "hi").await.unwrap();

        let read = messages.mark_read(sent.id).await.unwrap();
        let first = read.read_at.expect("read receipt set");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let again = messages.mark_read(sent.id).await.unwrap();
        assert_eq!(again.read_at, Some(first));
    }

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let (_, messages) = stores_with(&["alice"]).await;

        assert!(matches!(messages.get(999).await, Err(StoreError::NotFound(_))));
        assert!(matches!(messages.mark_read(999).await, Err(StoreError::NotFound(_))));
    }
}
