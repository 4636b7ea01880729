use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::auth::{AuthenticatedUser, LoginRequest, TokenResponse};
use crate::models::session::Session;
use crate::models::user::{RegisterRequest, Role, User};
use crate::repositories::{RepositoryError, SessionRepository, UserRepository};
use crate::security::{self, TokenError};

/// Authentication service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for AuthError {
    fn from(e: RepositoryError) -> Self {
        AuthError::DatabaseError(e.to_string())
    }
}

/// Trait defining authentication service operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user account and sign it in immediately
    async fn register(&self, request: RegisterRequest) -> Result<TokenResponse, AuthError>;

    /// Verify credentials and issue an access token, plus a refresh
    /// token when those are enabled
    async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AuthError>;

    /// Validate a bearer access token and resolve the caller
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    session_repository: Arc<dyn SessionRepository>,
    config: AuthConfig,
}

impl AuthServiceImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        session_repository: Arc<dyn SessionRepository>,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repository,
            session_repository,
            config,
        }
    }

    /// Issue an access token, and when refresh tokens are enabled, mint
    /// an opaque refresh token and persist its hash as a session.
    async fn issue_tokens(&self, user_id: Uuid) -> Result<TokenResponse, AuthError> {
        let (access_token, expires_in) = security::create_access_token(
            user_id,
            &self.config.jwt_secret,
            self.config.access_token_minutes,
        )
        .map_err(|e| AuthError::DatabaseError(format!("Token generation failed: {e}")))?;

        let refresh_token = if self.config.use_refresh_tokens {
            let raw = security::generate_token();
            let now = Utc::now();
            let session = Session {
                id: Uuid::new_v4(),
                user_id,
                refresh_token_hash: security::hash_token(&raw),
                expires_at: now + Duration::days(self.config.refresh_token_days),
                revoked_at: None,
                created_at: now,
            };
            self.session_repository.create(session).await?;
            Some(raw)
        } else {
            None
        };

        Ok(TokenResponse::new(access_token, refresh_token, expires_in))
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, request: RegisterRequest) -> Result<TokenResponse, AuthError> {
        let password_hash = security::hash_password(&request.password, self.config.bcrypt_cost)
            .map_err(|e| AuthError::DatabaseError(format!("Password hashing failed: {e}")))?;

        let user = User {
            id: Uuid::new_v4(),
            // Stored lowercase so the uniqueness check is case-insensitive
            email: request.email.to_lowercase(),
            password_hash,
            first_name: request.first_name,
            last_name: request.last_name,
            role: Role::Student,
            created_at: Utc::now(),
            updated_at: None,
        };

        let user = self.user_repository.create(user).await.map_err(|e| match e {
            RepositoryError::ConstraintViolation(_) => AuthError::DuplicateEmail,
            other => AuthError::DatabaseError(other.to_string()),
        })?;

        tracing::info!(user_id = %user.id, "registered new user");
        self.issue_tokens(user.id).await
    }

    async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AuthError> {
        // Unknown email and wrong password take the same path so the
        // response never reveals which failed.
        let user = self
            .user_repository
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = security::verify_password(&request.password, &user.password_hash)
            .map_err(|e| AuthError::DatabaseError(format!("Password verification failed: {e}")))?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(user.id).await
    }

    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let user_id = security::decode_access_token(token, &self.config.jwt_secret).map_err(
            |e| match e {
                TokenError::Expired => AuthError::TokenExpired,
                TokenError::Invalid => AuthError::InvalidToken,
            },
        )?;

        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            role: user.role,
        })
    }
}
