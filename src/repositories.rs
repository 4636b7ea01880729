pub mod category_repository;
pub mod password_reset_repository;
pub mod session_repository;
pub mod transaction_repository;
pub mod user_repository;

/// Repository errors for database operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Resource not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db.to_string())
            }
            other => RepositoryError::DatabaseError(other.to_string()),
        }
    }
}

pub use category_repository::{CategoryRepository, PostgresCategoryRepository};
pub use password_reset_repository::{PasswordResetRepository, PostgresPasswordResetRepository};
pub use session_repository::{PostgresSessionRepository, SessionRepository};
pub use transaction_repository::{PeriodRow, PostgresTransactionRepository, TransactionRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
