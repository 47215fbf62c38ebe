/// Authentication Routes
///
/// Thin HTTP adapters over the lifecycle engine: registration, login,
/// access-token validation, token refresh, and the current identity.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, TokenPair};
use crate::context::RequestContext;
use crate::error::AuthError;
use crate::middleware::AuthenticatedUser;

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub fingerprint: String,
}

/// Access token validation request
#[derive(Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
    pub fingerprint: String,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for AuthResponse {
    fn from(pair: TokenPair) -> Self {
        let expires_in = (pair.access_expires_at - Utc::now()).num_seconds().max(0);
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Identity behind a valid access token
#[derive(Serialize, Deserialize)]
pub struct ValidateResponse {
    pub email: String,
}

/// POST /auth/register
///
/// # Errors
/// - 400: Invalid email or weak password
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn register(
    ctx: RequestContext,
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    auth.register(&ctx, &form.email, &form.password).await?;
    Ok(HttpResponse::Created().finish())
}

/// POST /auth/login
///
/// Opens a new session bound to the client's fingerprint.
///
/// # Errors
/// - 400: Fingerprint is not a UUID
/// - 401: Wrong password
/// - 404: Unknown email
/// - 500: Internal server error
pub async fn login(
    ctx: RequestContext,
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    let pair = auth
        .login(&ctx, &form.email, &form.password, &form.fingerprint)
        .await?;
    Ok(HttpResponse::Ok().json(AuthResponse::from(pair)))
}

/// POST /auth/validate
///
/// # Errors
/// - 401: Expired or otherwise invalid access token
pub async fn validate(
    ctx: RequestContext,
    form: web::Json<ValidateRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    let email = auth.validate(&ctx, &form.token).await?;
    Ok(HttpResponse::Ok().json(ValidateResponse { email }))
}

/// POST /auth/refresh
///
/// Rotates the session: the presented refresh token is spent whether or
/// not the rotation succeeds past the session lookup.
///
/// # Errors
/// - 400: Fingerprint is not a UUID
/// - 401: Invalid token, expired session, or fingerprint mismatch
/// - 404: Session or user no longer exists
/// - 500: Internal server error
pub async fn refresh(
    ctx: RequestContext,
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    let pair = auth
        .refresh(&ctx, &form.refresh_token, &form.fingerprint)
        .await?;
    Ok(HttpResponse::Ok().json(AuthResponse::from(pair)))
}

/// GET /api/me
///
/// **Requires valid JWT access token** in Authorization header; the
/// identity is injected by the JWT middleware.
pub async fn get_current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().json(ValidateResponse {
        email: user.into_inner().email,
    })
}
