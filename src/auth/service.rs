/// Session & Token Lifecycle Engine
///
/// Decides, for register/login/validate/refresh, which credential state is
/// created, checked, rotated or destroyed. Holds no mutable state of its own;
/// everything lives behind the repository traits.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::jwt::{TokenManager, TokenPair};
use crate::auth::password::{validate_password_strength, PasswordHasher};
use crate::auth::sweeper::{SessionSweeper, SweeperHandle};
use crate::context::RequestContext;
use crate::domain::{NewUser, Session};
use crate::error::{AuthError, ConfigError, StoreError, TokenError};
use crate::repository::{SessionRepository, UserRepository};
use crate::validators::is_valid_email;

const REGISTER_METHOD: &str = "register";
const LOGIN_METHOD: &str = "login";
const VALIDATE_METHOD: &str = "validate";
const REFRESH_METHOD: &str = "refresh";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenManager>,
}

/// Log an expected, caller-attributable outcome and hand it back
fn rejected(ctx: &RequestContext, method: &str, err: AuthError) -> AuthError {
    tracing::info!(request_id = %ctx.request_id, method = method, error = %err, "Request rejected");
    err
}

/// Log an unexpected collaborator failure with its cause and wrap it as `Internal`
fn internal(ctx: &RequestContext, method: &str, what: &str, cause: impl std::fmt::Display) -> AuthError {
    let err = AuthError::internal(what, cause);
    tracing::warn!(request_id = %ctx.request_id, method = method, error = %err, "Request failed");
    err
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenManager>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            tokens,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    /// `UserExists`, `InvalidEmail`, `WeakPassword` (first violated rule), or `Internal`
    pub async fn register(&self, ctx: &RequestContext, email: &str, password: &str) -> Result<(), AuthError> {
        match self.users.get_user_by_email(email).await {
            Ok(_) => return Err(rejected(ctx, REGISTER_METHOD, AuthError::UserExists)),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(internal(ctx, REGISTER_METHOD, "can't check if user exists", e)),
        }

        if is_valid_email(email).is_err() {
            return Err(rejected(ctx, REGISTER_METHOD, AuthError::InvalidEmail));
        }

        if let Err(rule) = validate_password_strength(password) {
            return Err(rejected(ctx, REGISTER_METHOD, AuthError::WeakPassword(rule)));
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| internal(ctx, REGISTER_METHOD, "can't create password hash", e))?;

        let new_user = NewUser {
            email: email.to_string(),
            password_hash,
        };

        match self.users.create_user(new_user).await {
            Ok(user) => {
                tracing::info!(request_id = %ctx.request_id, user_id = user.id, "User registered successfully");
                Ok(())
            }
            // A concurrent registration won between the lookup and the insert
            Err(StoreError::UniqueViolation(_)) => Err(rejected(ctx, REGISTER_METHOD, AuthError::UserExists)),
            Err(e) => Err(internal(ctx, REGISTER_METHOD, "can't create user", e)),
        }
    }

    /// Authenticate by password and open a new session bound to `fingerprint`.
    ///
    /// # Errors
    /// `InvalidFingerprint`, `UserNotExists`, `InvalidPassword`, or `Internal`
    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
        fingerprint: &str,
    ) -> Result<TokenPair, AuthError> {
        let fingerprint = Uuid::parse_str(fingerprint)
            .map_err(|_| rejected(ctx, LOGIN_METHOD, AuthError::InvalidFingerprint))?;

        let user = match self.users.get_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                self.hasher.compare_against_decoy(password);
                return Err(rejected(ctx, LOGIN_METHOD, AuthError::UserNotExists));
            }
            Err(e) => return Err(internal(ctx, LOGIN_METHOD, "can't check if user exists", e)),
        };

        if !self.hasher.compare_hashes(password, &user.password_hash) {
            return Err(rejected(ctx, LOGIN_METHOD, AuthError::InvalidPassword));
        }

        let pair = self.open_session(ctx, LOGIN_METHOD, &user.email, user.id, fingerprint).await?;

        tracing::info!(request_id = %ctx.request_id, user_id = user.id, "User logged in successfully");
        Ok(pair)
    }

    /// Verify an access token and return the email it was issued to.
    ///
    /// Stateless: the user's continued existence is not re-checked.
    ///
    /// # Errors
    /// `InvalidToken` for expired and otherwise invalid tokens alike
    pub async fn validate(&self, ctx: &RequestContext, access_token: &str) -> Result<String, AuthError> {
        self.tokens
            .validate_access_token_and_get_email(access_token)
            .map_err(|e| {
                tracing::info!(request_id = %ctx.request_id, method = VALIDATE_METHOD, cause = %e, "Access token rejected");
                AuthError::InvalidToken
            })
    }

    /// Redeem a refresh token for a new pair. The presented session is
    /// destroyed before the fingerprint is checked, so a token can mint at
    /// most one successor even when the replay is detected.
    ///
    /// # Errors
    /// `InvalidFingerprint`, `InvalidToken`, `SessionExpired`, `SessionNotExists`,
    /// `InvalidSession`, `UserNotExists`, or `Internal`
    pub async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
        fingerprint: &str,
    ) -> Result<TokenPair, AuthError> {
        let fingerprint = Uuid::parse_str(fingerprint)
            .map_err(|_| rejected(ctx, REFRESH_METHOD, AuthError::InvalidFingerprint))?;

        let session_id = match self.tokens.validate_refresh_token_and_get_session_id(refresh_token) {
            Ok(session_id) => session_id,
            Err(TokenError::SessionExpired) | Err(TokenError::Expired) => {
                return Err(rejected(ctx, REFRESH_METHOD, AuthError::SessionExpired))
            }
            Err(_) => return Err(rejected(ctx, REFRESH_METHOD, AuthError::InvalidToken)),
        };

        let session = match self.sessions.get_session_by_id(session_id).await {
            Ok(session) => session,
            Err(StoreError::NotFound) => return Err(rejected(ctx, REFRESH_METHOD, AuthError::SessionNotExists)),
            Err(e) => return Err(internal(ctx, REFRESH_METHOD, "can't get user's session", e)),
        };

        match self.sessions.delete_session(session_id).await {
            Ok(true) => {}
            // Another refresh of the same token deleted it first
            Ok(false) => return Err(rejected(ctx, REFRESH_METHOD, AuthError::SessionNotExists)),
            Err(e) => return Err(internal(ctx, REFRESH_METHOD, "can't delete session", e)),
        }

        if session.fingerprint != fingerprint {
            tracing::warn!(
                request_id = %ctx.request_id,
                session_id = %session_id,
                user_id = session.user_id,
                "Refresh attempted with a different fingerprint, session revoked"
            );
            return Err(AuthError::InvalidSession);
        }

        let user = match self.users.get_user_by_id(session.user_id).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(rejected(ctx, REFRESH_METHOD, AuthError::UserNotExists)),
            Err(e) => return Err(internal(ctx, REFRESH_METHOD, "can't check if user exists", e)),
        };

        let pair = self.open_session(ctx, REFRESH_METHOD, &user.email, user.id, fingerprint).await?;

        tracing::info!(request_id = %ctx.request_id, user_id = user.id, "Token refreshed successfully");
        Ok(pair)
    }

    /// Build a sweeper over this engine's session store
    ///
    /// # Errors
    /// `InvalidValue` for a zero interval
    pub fn session_sweeper(&self, interval: Duration) -> Result<SessionSweeper, ConfigError> {
        SessionSweeper::new(self.sessions.clone(), interval)
    }

    /// Spawn the expiry sweeper; it runs until `shutdown` is cancelled
    pub fn start_clearing_expired_sessions(
        &self,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Result<SweeperHandle, ConfigError> {
        Ok(self.session_sweeper(interval)?.spawn(shutdown))
    }

    async fn open_session(
        &self,
        ctx: &RequestContext,
        method: &str,
        email: &str,
        user_id: i64,
        fingerprint: Uuid,
    ) -> Result<TokenPair, AuthError> {
        let session_id = Uuid::new_v4();

        let pair = self
            .tokens
            .generate_token_pair(email, session_id)
            .map_err(|e| internal(ctx, method, "can't generate token pair", e))?;

        let session = Session::new(session_id, user_id, fingerprint, pair.refresh_expires_at);
        self.sessions
            .create_session(&session)
            .await
            .map_err(|e| internal(ctx, method, "can't create user's session", e))?;

        Ok(pair)
    }
}
