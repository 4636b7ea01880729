use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ResetConfig;
use crate::models::password_reset::PasswordResetToken;
use crate::repositories::{PasswordResetRepository, RepositoryError, UserRepository};
use crate::security;

/// Password reset service errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordResetError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for PasswordResetError {
    fn from(e: RepositoryError) -> Self {
        PasswordResetError::DatabaseError(e.to_string())
    }
}

/// Trait defining password reset operations
#[async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Mint a reset token for the account, if one exists. Succeeds
    /// either way so the endpoint never confirms whether an email is
    /// registered.
    async fn request_reset(&self, email: &str) -> Result<(), PasswordResetError>;

    /// Redeem a reset token and set a new password. The token is
    /// single-use; any invalid, expired, or spent token fails the same
    /// way.
    async fn confirm_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), PasswordResetError>;
}

/// Implementation of PasswordResetService
pub struct PasswordResetServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    reset_repository: Arc<dyn PasswordResetRepository>,
    config: ResetConfig,
}

impl PasswordResetServiceImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        reset_repository: Arc<dyn PasswordResetRepository>,
        config: ResetConfig,
    ) -> Self {
        Self {
            user_repository,
            reset_repository,
            config,
        }
    }
}

#[async_trait]
impl PasswordResetService for PasswordResetServiceImpl {
    async fn request_reset(&self, email: &str) -> Result<(), PasswordResetError> {
        let Some(user) = self.user_repository.find_by_email(email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let raw = security::generate_token();
        let now = Utc::now();
        let token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_hash: security::hash_token(&raw),
            expires_at: now + Duration::minutes(self.config.reset_token_minutes),
            used_at: None,
            created_at: now,
        };
        self.reset_repository.create(token).await?;

        // No mail delivery is wired up; the raw token is surfaced in
        // debug logs for development use only.
        tracing::debug!(user_id = %user.id, token = %raw, "issued password reset token");
        Ok(())
    }

    async fn confirm_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), PasswordResetError> {
        let token_hash = security::hash_token(token);
        let stored = self
            .reset_repository
            .find_valid(&token_hash, Utc::now())
            .await?
            .ok_or(PasswordResetError::InvalidToken)?;

        let password_hash = security::hash_password(new_password, self.config.bcrypt_cost)
            .map_err(|e| {
                PasswordResetError::DatabaseError(format!("Password hashing failed: {e}"))
            })?;

        self.reset_repository
            .redeem(stored.id, stored.user_id, &password_hash)
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent redeem
                RepositoryError::NotFound => PasswordResetError::InvalidToken,
                other => PasswordResetError::DatabaseError(other.to_string()),
            })?;

        tracing::info!(user_id = %stored.user_id, "password reset completed");
        Ok(())
    }
}
