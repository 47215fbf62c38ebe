use std::net::TcpListener;
use std::sync::Arc;

use session_auth::auth::{AuthService, BcryptHasher, JwtTokenManager};
use session_auth::configuration::get_configuration;
use session_auth::repository::PgAuthRepository;
use session_auth::startup::run;
use session_auth::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    if let Err(e) = init_telemetry("info") {
        eprintln!("Failed to initialise telemetry: {}", e);
    }

    tracing::info!("Starting application");

    // 설정 로드 및 검증
    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };
    if let Err(e) = configuration.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
    tracing::info!("Configuration loaded successfully");

    // 데이터베이스 연결 풀 생성
    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(configuration.database.max_connections)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;
    tracing::info!("Database connection pool created successfully");

    // 인증 엔진 구성
    let repository = Arc::new(PgAuthRepository::new(pool));
    let hasher = BcryptHasher::new(configuration.auth.bcrypt_cost).map_err(|e| {
        tracing::error!("Failed to create password hasher: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let auth_service = AuthService::new(
        repository.clone(),
        repository,
        Arc::new(hasher),
        Arc::new(JwtTokenManager::new(&configuration.jwt)),
    );

    // 만료 세션 정리 작업 시작
    let sweeper = auth_service
        .start_clearing_expired_sessions(
            configuration.auth.session_clear_interval(),
            CancellationToken::new(),
        )
        .map_err(|e| {
            tracing::error!("Failed to start session sweeper: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
        })?;

    // 서버 주소 설정
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행 (SIGINT/SIGTERM 시 종료)
    let result = run(listener, auth_service)?.await;

    sweeper.stop().await;
    tracing::info!("Server stopped");

    result
}
