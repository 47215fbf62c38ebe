/// Persistence contracts used by the lifecycle engine
///
/// The engine only talks to these traits; `postgres` is the production
/// implementation and `memory` backs tests and local runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{NewUser, Session, User};
use crate::error::StoreError;

pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `StoreError::NotFound` when no user has this email
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// `StoreError::NotFound` when no user has this id
    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError>;

    /// Insert a user and return it with its store-assigned id.
    /// A duplicate email is `StoreError::UniqueViolation`.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: &Session) -> Result<(), StoreError>;

    /// `StoreError::NotFound` when no session has this id
    async fn get_session_by_id(&self, session_id: Uuid) -> Result<Session, StoreError>;

    /// Delete one session. Returns whether a row was actually removed, so
    /// concurrent callers racing on the same id see exactly one `true`.
    async fn delete_session(&self, session_id: Uuid) -> Result<bool, StoreError>;

    /// Delete every session with `expires_at <= cutoff`; returns the count removed
    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
