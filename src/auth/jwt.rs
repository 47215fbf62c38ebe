/// JWT Token Generation and Validation
///
/// Signs and verifies the two credential classes. Access and refresh tokens
/// use separate secrets so a leaked key can only forge its own class.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::TokenError;

/// Access/refresh credential pair handed to the caller. Never persisted.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Token signer/verifier used by the lifecycle engine
pub trait TokenManager: Send + Sync {
    /// Sign an access token carrying `user_email` and a refresh token carrying `session_id`
    fn generate_token_pair(&self, user_email: &str, session_id: Uuid) -> Result<TokenPair, TokenError>;

    /// Verify an access token and return its email claim.
    ///
    /// # Errors
    /// `Expired` past expiry, `Invalid` for any other verification failure
    fn validate_access_token_and_get_email(&self, token: &str) -> Result<String, TokenError>;

    /// Verify a refresh token and return its session id claim.
    ///
    /// # Errors
    /// `SessionExpired` past expiry, `Invalid` for any other verification failure
    fn validate_refresh_token_and_get_session_id(&self, token: &str) -> Result<Uuid, TokenError>;
}

/// HS256 implementation of [`TokenManager`]
pub struct JwtTokenManager {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    issuer: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    validation: Validation,
}

impl JwtTokenManager {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Verify issuer matches configuration
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            validation,
        }
    }

    fn sign<T: Serialize>(claims: &T, key: &EncodingKey) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Decode and verify signature, issuer and presence of `exp`.
    /// `ExpiredSignature` maps to `expired`; everything else is `Invalid`.
    fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        key: &DecodingKey,
        expired: TokenError,
    ) -> Result<T, TokenError> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => expired,
                _ => {
                    tracing::debug!("JWT validation error: {}", e);
                    TokenError::Invalid
                }
            })
    }
}

impl TokenManager for JwtTokenManager {
    fn generate_token_pair(&self, user_email: &str, session_id: Uuid) -> Result<TokenPair, TokenError> {
        let now = Utc::now();

        let access_claims = AccessClaims::new(
            user_email.to_string(),
            now,
            self.access_token_expiry,
            self.issuer.clone(),
        )?;
        let refresh_claims =
            RefreshClaims::new(session_id, now, self.refresh_token_expiry, self.issuer.clone())?;

        // Reported expiries are exactly the signed `exp` claims
        let access_expires_at = access_claims.expires_at()?;
        let refresh_expires_at = refresh_claims.expires_at()?;

        let access_token = Self::sign(&access_claims, &self.access_encoding)?;
        let refresh_token = Self::sign(&refresh_claims, &self.refresh_encoding)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn validate_access_token_and_get_email(&self, token: &str) -> Result<String, TokenError> {
        let claims: AccessClaims = self.verify(token, &self.access_decoding, TokenError::Expired)?;

        // The decoder accepts exp == now; that instant already counts as expired
        if claims.is_expired_at(Utc::now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims.email)
    }

    fn validate_refresh_token_and_get_session_id(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims: RefreshClaims =
            self.verify(token, &self.refresh_decoding, TokenError::SessionExpired)?;

        if claims.is_expired_at(Utc::now()) {
            return Err(TokenError::SessionExpired);
        }

        Ok(claims.sid)
    }
}
