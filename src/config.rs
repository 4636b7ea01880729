use std::env;

/// Configuration errors raised during startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

/// Settings for token issuance and password hashing.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub use_refresh_tokens: bool,
    pub refresh_token_days: i64,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Config suitable for unit tests: low bcrypt cost, refresh tokens off.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            jwt_secret: "test_secret".to_string(),
            access_token_minutes: 30,
            use_refresh_tokens: false,
            refresh_token_days: 30,
            bcrypt_cost: 4,
        }
    }
}

/// Settings for password reset token issuance.
#[derive(Debug, Clone)]
pub struct ResetConfig {
    pub reset_token_minutes: i64,
    pub bcrypt_cost: u32,
}

/// Application settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub use_refresh_tokens: bool,
    pub refresh_token_days: i64,
    pub reset_token_minutes: i64,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
            access_token_minutes: parse_var("ACCESS_TOKEN_MINUTES", 30)?,
            use_refresh_tokens: parse_var("USE_REFRESH_TOKENS", false)?,
            refresh_token_days: parse_var("REFRESH_TOKEN_DAYS", 30)?,
            reset_token_minutes: parse_var("RESET_TOKEN_MINUTES", 60)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            access_token_minutes: self.access_token_minutes,
            use_refresh_tokens: self.use_refresh_tokens,
            refresh_token_days: self.refresh_token_days,
            bcrypt_cost: self.bcrypt_cost,
        }
    }

    pub fn reset(&self) -> ResetConfig {
        ResetConfig {
            reset_token_minutes: self.reset_token_minutes,
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidVar(name, e.to_string())),
        Err(_) => Ok(default),
    }
}
