use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{NewUser, Session, User};
use crate::error::StoreError;
use crate::repository::{SessionRepository, UserRepository};

/// Postgres-backed users and sessions. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgAuthRepository {
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, email, password_hash)| User {
            id,
            email,
            password_hash,
        })
        .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, email, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, email, password_hash)| User {
            id,
            email,
            password_hash,
        })
        .ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (email, password_hash, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(User {
            id,
            email: user.email,
            password_hash: user.password_hash,
        })
    }
}

#[async_trait]
impl SessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, fingerprint, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.fingerprint)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> Result<Session, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, i64, Uuid, DateTime<Utc>)>(
            "SELECT id, user_id, fingerprint, expires_at FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, user_id, fingerprint, expires_at)| {
            Session::new(id, user_id, fingerprint, expires_at)
        })
        .ok_or(StoreError::NotFound)
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
