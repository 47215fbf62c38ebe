use std::time::Duration;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Longest accepted token lifetime: 10 years, in seconds
pub const MAX_TOKEN_EXPIRY: i64 = 10 * 365 * 24 * 60 * 60;

/// JWT signing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

/// Password hashing and session housekeeping settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub bcrypt_cost: u32,
    pub session_clear_interval: u64, // seconds
}

impl AuthSettings {
    pub fn session_clear_interval(&self) -> Duration {
        Duration::from_secs(self.session_clear_interval)
    }
}

impl Settings {
    /// Reject configurations the service must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.auth.validate()
    }
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.access_secret".to_string()));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.refresh_secret".to_string()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            ));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.issuer".to_string()));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt token expiries must be positive".to_string(),
            ));
        }
        if self.access_token_expiry > MAX_TOKEN_EXPIRY || self.refresh_token_expiry > MAX_TOKEN_EXPIRY {
            return Err(ConfigError::InvalidValue(format!(
                "jwt token expiries must not exceed {} seconds",
                MAX_TOKEN_EXPIRY
            )));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.bcrypt_cost must be within 4..=31, got {}",
                self.bcrypt_cost
            )));
        }
        if self.session_clear_interval == 0 {
            return Err(ConfigError::InvalidValue(
                "auth.session_clear_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from `configuration.*` in the working directory, then
/// `APP_`-prefixed environment variables (`APP_JWT__ACCESS_SECRET=...`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
