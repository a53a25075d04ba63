/// Database row types — these map directly to SQLite rows.
/// Distinct from the courier-types API models to keep the DB layer independent.

pub struct UserRow {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: String,
    pub last_login_at: String,
}

/// Public identity columns only, as selected for listings and joins.
pub struct ContactRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// One entry of a message feed: the counterpart's contact columns joined in.
pub struct MessageFeedRow {
    pub id: i64,
    pub counterpart: ContactRow,
    pub body: String,
    pub sent_at: String,
    pub read_at: Option<String>,
}

/// A full message row with both endpoints joined.
pub struct MessageRow {
    pub id: i64,
    pub from_user: ContactRow,
    pub to_user: ContactRow,
    pub body: String,
    pub sent_at: String,
    pub read_at: Option<String>,
}
