use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{NewUser, Session, User};
use crate::error::StoreError;
use crate::repository::{SessionRepository, UserRepository};

#[derive(Default)]
struct State {
    last_user_id: i64,
    users: HashMap<i64, User>,
    sessions: HashMap<Uuid, Session>,
}

/// Users and sessions kept in process memory.
///
/// Every operation takes the lock once, so each call is atomic with respect
/// to the others, matching the single-statement semantics of the SQL store.
#[derive(Default)]
pub struct InMemoryAuthRepository {
    state: Mutex<State>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unexpected("repository lock poisoned".to_string()))
    }

    pub fn user_count(&self) -> usize {
        self.lock().map(|state| state.users.len()).unwrap_or(0)
    }

    pub fn session_count(&self) -> usize {
        self.lock().map(|state| state.sessions.len()).unwrap_or(0)
    }
}

#[async_trait]
impl UserRepository for InMemoryAuthRepository {
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.lock()?
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.lock()?;

        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::UniqueViolation(format!(
                "email {} already registered",
                user.email
            )));
        }

        state.last_user_id += 1;
        let created = User {
            id: state.last_user_id,
            email: user.email,
            password_hash: user.password_hash,
        };
        state.users.insert(created.id, created.clone());

        Ok(created)
    }
}

#[async_trait]
impl SessionRepository for InMemoryAuthRepository {
    async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut state = self.lock()?;

        if state.sessions.contains_key(&session.id) {
            return Err(StoreError::UniqueViolation(format!(
                "session {} already exists",
                session.id
            )));
        }
        state.sessions.insert(session.id, session.clone());

        Ok(())
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> Result<Session, StoreError> {
        self.lock()?
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock()?.sessions.remove(&session_id).is_some())
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let before = state.sessions.len();
        state.sessions.retain(|_, session| !session.is_expired_at(cutoff));

        Ok((before - state.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_assigns_increasing_ids() {
        let repo = InMemoryAuthRepository::new();

        let first = repo.create_user(new_user("a@example.com")).await.unwrap();
        let second = repo.create_user(new_user("b@example.com")).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(repo.get_user_by_id(first.id).await.unwrap().email, "a@example.com");
        assert_eq!(repo.get_user_by_email("b@example.com").await.unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let repo = InMemoryAuthRepository::new();
        repo.create_user(new_user("a@example.com")).await.unwrap();

        let result = repo.create_user(new_user("a@example.com")).await;

        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_found() {
        let repo = InMemoryAuthRepository::new();

        assert_eq!(repo.get_user_by_email("x@example.com").await, Err(StoreError::NotFound));
        assert_eq!(repo.get_user_by_id(42).await, Err(StoreError::NotFound));
        assert_eq!(repo.get_session_by_id(Uuid::new_v4()).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_session_reports_single_winner() {
        let repo = InMemoryAuthRepository::new();
        let session = Session::new(Uuid::new_v4(), 1, Uuid::new_v4(), Utc::now() + Duration::hours(1));
        repo.create_session(&session).await.unwrap();

        assert!(repo.delete_session(session.id).await.unwrap());
        assert!(!repo.delete_session(session.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_is_inclusive_and_idempotent() {
        let repo = InMemoryAuthRepository::new();
        let now = Utc::now();
        for expires_at in [now - Duration::hours(1), now, now + Duration::hours(1)] {
            let session = Session::new(Uuid::new_v4(), 1, Uuid::new_v4(), expires_at);
            repo.create_session(&session).await.unwrap();
        }

        assert_eq!(repo.delete_expired(now).await.unwrap(), 2);
        assert_eq!(repo.delete_expired(now).await.unwrap(), 0);
        assert_eq!(repo.session_count(), 1);
    }
}
