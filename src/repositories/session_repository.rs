use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::session::Session;
use crate::repositories::RepositoryError;

/// Trait defining refresh-token session repository operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session row for an issued refresh token
    async fn create(&self, session: Session) -> Result<Session, RepositoryError>;
}

/// PostgreSQL implementation of SessionRepository
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, RepositoryError> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, refresh_token_hash, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, refresh_token_hash, expires_at, revoked_at, created_at",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.refresh_token_hash)
        .bind(session.expires_at)
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }
}
