use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Refresh-token session. Only the SHA-256 hash of the raw token is
/// stored; the raw value is returned to the client once at login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
