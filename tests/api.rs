//! Integration tests for the HTTP surface

use std::net::TcpListener;
use std::sync::Arc;

use serde_json::{json, Value};
use session_auth::auth::{AuthService, BcryptHasher, JwtTokenManager};
use session_auth::configuration::JwtSettings;
use session_auth::error::ErrorResponse;
use session_auth::logger::REQUEST_ID_HEADER;
use session_auth::repository::InMemoryAuthRepository;
use session_auth::routes::{AuthResponse, ValidateResponse};
use session_auth::startup::run;

const EMAIL: &str = "john@example.com";
const PASSWORD: &str = "SecurePass12!!";

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryAuthRepository>,
    pub client: reqwest::Client,
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let jwt = JwtSettings {
        access_secret: "api-test-access-secret".to_string(),
        refresh_secret: "api-test-refresh-secret".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 3600,
        issuer: "session-auth-test".to_string(),
    };
    let repo = Arc::new(InMemoryAuthRepository::new());
    let auth_service = AuthService::new(
        repo.clone(),
        repo.clone(),
        Arc::new(BcryptHasher::new(4).expect("Failed to build hasher")),
        Arc::new(JwtTokenManager::new(&jwt)),
    );

    let server = run(listener, auth_service).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        repo,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn register(&self) {
        let response = self
            .post("/auth/register", &json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        assert_eq!(201, response.status().as_u16());
    }

    async fn login(&self, fingerprint: &str) -> AuthResponse {
        let response = self
            .post(
                "/auth/login",
                &json!({ "email": EMAIL, "password": PASSWORD, "fingerprint": fingerprint }),
            )
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

fn fingerprint() -> String {
    uuid::Uuid::new_v4().to_string()
}

// --- Health check ---

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

// --- Registration ---

#[tokio::test]
async fn register_returns_201_for_valid_credentials() {
    let app = spawn_app();

    app.register().await;

    assert_eq!(app.repo.user_count(), 1);
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app();
    app.register().await;

    let response = app
        .post("/auth/register", &json!({ "email": EMAIL, "password": PASSWORD }))
        .await;

    assert_eq!(409, response.status().as_u16());
    let body: ErrorResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(body.code, "ALREADY_EXISTS");
    assert_eq!(app.repo.user_count(), 1);
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app();

    let test_cases = vec![
        (json!({ "email": "not-an-email", "password": PASSWORD }), "invalid email"),
        (json!({ "email": EMAIL, "password": "abcdef" }), "weak password"),
        (json!({ "email": EMAIL }), "missing password"),
    ];

    for (body, description) in test_cases {
        let response = app.post("/auth/register", &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when the payload was {}.",
            description
        );
    }
    assert_eq!(app.repo.user_count(), 0);
}

// --- Login / Validate ---

#[tokio::test]
async fn login_returns_bearer_token_pair() {
    let app = spawn_app();
    app.register().await;

    let tokens = app.login(&fingerprint()).await;

    assert_eq!(tokens.token_type, "Bearer");
    assert!(tokens.expires_in > 0 && tokens.expires_in <= 900);
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
    assert_eq!(app.repo.session_count(), 1);
}

#[tokio::test]
async fn login_maps_failures_to_status_codes() {
    let app = spawn_app();
    app.register().await;

    let wrong_password = app
        .post(
            "/auth/login",
            &json!({ "email": EMAIL, "password": "WrongPass12!!", "fingerprint": fingerprint() }),
        )
        .await;
    assert_eq!(401, wrong_password.status().as_u16());

    let unknown_user = app
        .post(
            "/auth/login",
            &json!({ "email": "nobody@example.com", "password": PASSWORD, "fingerprint": fingerprint() }),
        )
        .await;
    assert_eq!(404, unknown_user.status().as_u16());

    let bad_fingerprint = app
        .post(
            "/auth/login",
            &json!({ "email": EMAIL, "password": PASSWORD, "fingerprint": "not-a-uuid" }),
        )
        .await;
    assert_eq!(400, bad_fingerprint.status().as_u16());
}

#[tokio::test]
async fn validate_returns_email_for_access_token() {
    let app = spawn_app();
    app.register().await;
    let tokens = app.login(&fingerprint()).await;

    let response = app
        .post("/auth/validate", &json!({ "token": tokens.access_token }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: ValidateResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(body.email, EMAIL);
}

#[tokio::test]
async fn validate_returns_401_for_invalid_token() {
    let app = spawn_app();

    let response = app
        .post("/auth/validate", &json!({ "token": "invalid.token.here" }))
        .await;

    assert_eq!(401, response.status().as_u16());
    let body: ErrorResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(body.code, "PERMISSION_DENIED");
}

// --- Refresh ---

#[tokio::test]
async fn refresh_rotates_tokens_once() {
    let app = spawn_app();
    app.register().await;
    let fp = fingerprint();
    let tokens = app.login(&fp).await;

    let body = json!({ "refresh_token": tokens.refresh_token, "fingerprint": fp });

    let first = app.post("/auth/refresh", &body).await;
    assert_eq!(200, first.status().as_u16());
    let rotated: AuthResponse = first.json().await.expect("Failed to parse response");
    assert_ne!(rotated.refresh_token, tokens.refresh_token);

    let replay = app.post("/auth/refresh", &body).await;
    assert_eq!(404, replay.status().as_u16());
}

#[tokio::test]
async fn refresh_with_other_fingerprint_returns_401_and_revokes() {
    let app = spawn_app();
    app.register().await;
    let fp = fingerprint();
    let tokens = app.login(&fp).await;

    let stolen = app
        .post(
            "/auth/refresh",
            &json!({ "refresh_token": tokens.refresh_token, "fingerprint": fingerprint() }),
        )
        .await;

    assert_eq!(401, stolen.status().as_u16());
    assert_eq!(app.repo.session_count(), 0);
}

// --- Protected routes ---

#[tokio::test]
async fn me_requires_bearer_token() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/api/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn me_returns_identity_for_valid_token() {
    let app = spawn_app();
    app.register().await;
    let tokens = app.login(&fingerprint()).await;

    let response = app
        .client
        .get(&format!("{}/api/me", &app.address))
        .bearer_auth(&tokens.access_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: ValidateResponse = response.json().await.expect("Failed to parse response");
    assert_eq!(body.email, EMAIL);
}

#[tokio::test]
async fn me_rejects_refresh_token() {
    let app = spawn_app();
    app.register().await;
    let tokens = app.login(&fingerprint()).await;

    let response = app
        .client
        .get(&format!("{}/api/me", &app.address))
        .bearer_auth(&tokens.refresh_token)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}
