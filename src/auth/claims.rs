/// JWT Claims structures
///
/// Access and refresh credentials carry different payloads and are verified
/// under different rules, so each has its own record instead of a shared one.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

fn expiry_from(iat: i64, expiry_seconds: i64) -> Result<i64, TokenError> {
    iat.checked_add(expiry_seconds)
        .ok_or_else(|| TokenError::Signing(format!("token expiry {}s out of range", expiry_seconds)))
}

fn timestamp_to_datetime(exp: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(exp, 0)
        .single()
        .ok_or_else(|| TokenError::Signing(format!("token expiry {} out of range", exp)))
}

/// Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// User email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl AccessClaims {
    /// Create new access claims valid for `expiry_seconds` from `now`
    ///
    /// # Errors
    /// `Signing` when the expiry overflows the timestamp range
    pub fn new(
        email: String,
        now: DateTime<Utc>,
        expiry_seconds: i64,
        issuer: String,
    ) -> Result<Self, TokenError> {
        let iat = now.timestamp();
        Ok(Self {
            email,
            exp: expiry_from(iat, expiry_seconds)?,
            iat,
            iss: issuer,
        })
    }

    /// Expired at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn expires_at(&self) -> Result<DateTime<Utc>, TokenError> {
        timestamp_to_datetime(self.exp)
    }
}

/// Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    /// Session the token redeems
    pub sid: Uuid,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(
        session_id: Uuid,
        now: DateTime<Utc>,
        expiry_seconds: i64,
        issuer: String,
    ) -> Result<Self, TokenError> {
        let iat = now.timestamp();
        Ok(Self {
            sid: session_id,
            exp: expiry_from(iat, expiry_seconds)?,
            iat,
            iss: issuer,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// Expiry as a timestamp, used as the session row's `expires_at`
    pub fn expires_at(&self) -> Result<DateTime<Utc>, TokenError> {
        timestamp_to_datetime(self.exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims_creation() {
        let now = Utc::now();
        let claims = AccessClaims::new("test@example.com".to_string(), now, 3600, "test".to_string()).unwrap();

        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_exact_boundary_is_expired() {
        let now = Utc::now();
        let claims = RefreshClaims::new(Uuid::new_v4(), now, 0, "test".to_string()).unwrap();

        assert!(claims.is_expired_at(now));
    }

    #[test]
    fn test_refresh_expires_at_matches_exp() {
        let now = Utc::now();
        let claims = RefreshClaims::new(Uuid::new_v4(), now, 60, "test".to_string()).unwrap();

        assert_eq!(claims.expires_at().unwrap().timestamp(), claims.exp);
    }

    #[test]
    fn test_out_of_range_expiry_is_an_error() {
        let now = Utc::now();

        let overflow = AccessClaims::new("test@example.com".to_string(), now, i64::MAX, "test".to_string());
        assert!(matches!(overflow, Err(TokenError::Signing(_))));

        // Fits in i64 but not in a calendar date
        let claims = RefreshClaims::new(Uuid::new_v4(), now, 100_000_000_000_000, "test".to_string()).unwrap();
        assert!(matches!(claims.expires_at(), Err(TokenError::Signing(_))));
    }
}
