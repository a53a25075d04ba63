use crate::Database;
use crate::models::{ContactRow, MessageFeedRow, MessageRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, first_name, last_name, phone, join_at, last_login_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![username, password_hash, first_name, last_name, phone, now],
            )?;
            Ok(())
        })
    }

    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT password FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Returns false when no row matched.
    pub fn touch_last_login(&self, username: &str, now: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET last_login_at = ?2 WHERE username = ?1",
                rusqlite::params![username, now],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn list_users(&self) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, first_name, last_name, phone
                 FROM users
                 ORDER BY username ASC",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ContactRow {
                        username: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        phone: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, username))
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1",
                    [username],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        from_username: &str,
        to_username: &str,
        body: &str,
        now: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (from_username, to_username, body, sent_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![from_username, to_username, body, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn messages_from(&self, username: &str) -> Result<Vec<MessageFeedRow>> {
        self.with_conn(|conn| query_messages_from(conn, username))
    }

    pub fn messages_to(&self, username: &str) -> Result<Vec<MessageFeedRow>> {
        self.with_conn(|conn| query_messages_to(conn, username))
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Sets the read receipt only while it is still NULL; returns false
    /// when no row transitioned.
    pub fn mark_message_read(&self, id: i64, now: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE messages SET read_at = ?2 WHERE id = ?1 AND read_at IS NULL",
                rusqlite::params![id, now],
            )?;
            Ok(updated > 0)
        })
    }
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, password, first_name, last_name, phone, join_at, last_login_at
         FROM users
         WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                password: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone: row.get(4)?,
                join_at: row.get(5)?,
                last_login_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_messages_from(conn: &Connection, username: &str) -> Result<Vec<MessageFeedRow>> {
    // JOIN users to fetch the recipient's contact columns in a single query
    let mut stmt = conn.prepare(
        "SELECT m.id, u.username, u.first_name, u.last_name, u.phone, m.body, m.sent_at, m.read_at
         FROM messages m
         JOIN users u ON m.to_username = u.username
         WHERE m.from_username = ?1
         ORDER BY m.sent_at ASC, m.id ASC",
    )?;

    let rows = stmt
        .query_map([username], feed_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_messages_to(conn: &Connection, username: &str) -> Result<Vec<MessageFeedRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, u.username, u.first_name, u.last_name, u.phone, m.body, m.sent_at, m.read_at
         FROM messages m
         JOIN users u ON m.from_username = u.username
         WHERE m.to_username = ?1
         ORDER BY m.sent_at ASC, m.id ASC",
    )?;

    let rows = stmt
        .query_map([username], feed_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn feed_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageFeedRow, rusqlite::Error> {
    Ok(MessageFeedRow {
        id: row.get(0)?,
        counterpart: ContactRow {
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            phone: row.get(4)?,
        },
        body: row.get(5)?,
        sent_at: row.get(6)?,
        read_at: row.get(7)?,
    })
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id,
                f.username, f.first_name, f.last_name, f.phone,
                t.username, t.first_name, t.last_name, t.phone,
                m.body, m.sent_at, m.read_at
         FROM messages m
         JOIN users f ON m.from_username = f.username
         JOIN users t ON m.to_username = t.username
         WHERE m.id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                from_user: ContactRow {
                    username: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                    phone: row.get(4)?,
                },
                to_user: ContactRow {
                    username: row.get(5)?,
                    first_name: row.get(6)?,
                    last_name: row.get(7)?,
                    phone: row.get(8)?,
                },
                body: row.get(9)?,
                sent_at: row.get(10)?,
                read_at: row.get(11)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
