use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered user. `password_hash` is never the plaintext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

/// A user about to be inserted; the store assigns the id.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Proof of an active, renewable login.
///
/// A row exists only while the refresh credential carrying `id` has been
/// neither redeemed nor swept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub fingerprint: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid, user_id: i64, fingerprint: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            fingerprint,
            expires_at,
        }
    }

    /// Expired at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
