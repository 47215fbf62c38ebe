/// Error Handling Module
///
/// This module holds every error type the service produces:
/// 1. Collaborator errors (store, token signer, password hasher, configuration)
/// 2. The engine's outcome taxonomy (`AuthError`)
/// 3. Wire classification of outcomes (`ErrorClass`)
/// 4. HTTP response mapping with structured logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::auth::PasswordRule;

// ============================================================================
// 1. COLLABORATOR ERROR TYPES
// ============================================================================

/// Errors returned by user and session repositories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    UniqueViolation(String),
    Unexpected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "entity was not found"),
            StoreError::UniqueViolation(msg) => write!(f, "duplicate entry: {}", msg),
            StoreError::Unexpected(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            other => StoreError::Unexpected(other.to_string()),
        }
    }
}

/// Errors returned by the token signer/verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Access credential is past its expiry
    Expired,
    /// Refresh credential is past its expiry
    SessionExpired,
    /// Bad signature, wrong issuer, malformed claims, garbage input
    Invalid,
    /// Key misconfiguration while signing
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::SessionExpired => write!(f, "session token has expired"),
            TokenError::Invalid => write!(f, "token is invalid"),
            TokenError::Signing(msg) => write!(f, "can't sign token: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Errors returned by the password hasher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    HashingFailure(String),
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::HashingFailure(msg) => write!(f, "password hashing failed: {}", msg),
        }
    }
}

impl StdError for PasswordError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

// ============================================================================
// 2. ENGINE OUTCOME TAXONOMY
// ============================================================================

/// Every failure the lifecycle engine can report.
///
/// All variants except `Internal` are expected, caller-attributable outcomes.
/// `Internal` carries the cause for local logging only; it never reaches the
/// caller's response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    UserExists,
    UserNotExists,
    InvalidPassword,
    InvalidToken,
    InvalidEmail,
    WeakPassword(PasswordRule),
    InvalidFingerprint,
    SessionNotExists,
    InvalidSession,
    SessionExpired,
    Internal(String),
}

impl AuthError {
    /// Wrap an unexpected collaborator failure with a short description
    pub fn internal(what: &str, cause: impl fmt::Display) -> Self {
        AuthError::Internal(format!("{}: {}", what, cause))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Internal(_))
    }

    /// Wire bucket for this outcome
    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::UserExists => ErrorClass::AlreadyExists,
            AuthError::UserNotExists | AuthError::SessionNotExists => ErrorClass::NotFound,
            AuthError::InvalidPassword
            | AuthError::InvalidToken
            | AuthError::InvalidSession
            | AuthError::SessionExpired => ErrorClass::PermissionDenied,
            AuthError::InvalidEmail
            | AuthError::WeakPassword(_)
            | AuthError::InvalidFingerprint => ErrorClass::InvalidArgument,
            AuthError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Message safe to show across the trust boundary
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UserExists => write!(f, "user already exists"),
            AuthError::UserNotExists => write!(f, "user doesn't exist"),
            AuthError::InvalidPassword => write!(f, "user password is invalid"),
            AuthError::InvalidToken => write!(f, "token is invalid"),
            AuthError::InvalidEmail => write!(f, "email is invalid"),
            AuthError::WeakPassword(rule) => write!(f, "password is too weak: {}", rule),
            AuthError::InvalidFingerprint => write!(f, "fingerprint must be correct uuid"),
            AuthError::SessionNotExists => write!(f, "session doesn't exist"),
            AuthError::InvalidSession => write!(f, "session is invalid"),
            AuthError::SessionExpired => write!(f, "session has expired"),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AuthError {}

// ============================================================================
// 3. WIRE CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    AlreadyExists,
    NotFound,
    PermissionDenied,
    InvalidArgument,
    Internal,
}

impl ErrorClass {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorClass::AlreadyExists => StatusCode::CONFLICT,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::PermissionDenied => StatusCode::UNAUTHORIZED,
            ErrorClass::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorClass::AlreadyExists => "ALREADY_EXISTS",
            ErrorClass::NotFound => "NOT_FOUND",
            ErrorClass::PermissionDenied => "PERMISSION_DENIED",
            ErrorClass::InvalidArgument => "INVALID_ARGUMENT",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

// ============================================================================
// 4. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        let class = self.class();

        if let AuthError::Internal(cause) = self {
            tracing::error!(error_id = %error_id, error = %cause, "Internal error");
        }

        let body = ErrorResponse::new(
            error_id,
            self.public_message(),
            class.code().to_string(),
            class.status_code().as_u16(),
        );

        HttpResponse::build(class.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.class().status_code()
    }
}
