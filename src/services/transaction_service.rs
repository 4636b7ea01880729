use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::auth::AuthenticatedUser;
use crate::models::filters::{
    AggregateQuery, AggregateResponse, AggregateRows, GroupBy, PeriodAggregate, TransactionQuery,
};
use crate::models::transaction::{Transaction, TransactionRequest};
use crate::repositories::{CategoryRepository, RepositoryError, TransactionRepository};

/// Transaction service errors
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Amount must be a positive number of cents")]
    InvalidAmount,

    #[error("Occurrence time cannot be in the future")]
    FutureDate,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Transaction not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for TransactionError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => TransactionError::NotFound,
            other => TransactionError::DatabaseError(other.to_string()),
        }
    }
}

/// Trait defining transaction service operations. Reads and writes are
/// scoped by the caller's visibility: students reach only their own
/// rows, admins reach everything.
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Record a new transaction for the caller
    async fn create(
        &self,
        auth: &AuthenticatedUser,
        request: TransactionRequest,
    ) -> Result<Transaction, TransactionError>;

    /// Fetch one transaction by ID
    async fn get(
        &self,
        auth: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<Transaction, TransactionError>;

    /// List transactions with filters, sorting and pagination
    async fn list(
        &self,
        auth: &AuthenticatedUser,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, TransactionError>;

    /// Replace an existing transaction
    async fn update(
        &self,
        auth: &AuthenticatedUser,
        id: Uuid,
        request: TransactionRequest,
    ) -> Result<Transaction, TransactionError>;

    /// Delete a transaction
    async fn delete(&self, auth: &AuthenticatedUser, id: Uuid) -> Result<(), TransactionError>;

    /// Aggregate matching transactions by category or calendar period
    async fn aggregate(
        &self,
        auth: &AuthenticatedUser,
        query: &AggregateQuery,
    ) -> Result<AggregateResponse, TransactionError>;
}

/// Implementation of TransactionService
pub struct TransactionServiceImpl {
    transaction_repository: Arc<dyn TransactionRepository>,
    category_repository: Arc<dyn CategoryRepository>,
}

impl TransactionServiceImpl {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepository>,
        category_repository: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            transaction_repository,
            category_repository,
        }
    }

    /// Shared create/update validation: positive amount, no future
    /// occurrence time, and the referenced category must belong to the
    /// caller.
    async fn validate_request(
        &self,
        auth: &AuthenticatedUser,
        request: &TransactionRequest,
    ) -> Result<(), TransactionError> {
        if request.amount_cents <= 0 {
            return Err(TransactionError::InvalidAmount);
        }

        if let Some(occurred_at) = request.occurred_at {
            if occurred_at > Utc::now() {
                return Err(TransactionError::FutureDate);
            }
        }

        if let Some(category_id) = request.category_id {
            self.category_repository
                .find_by_id(auth.user_id, category_id)
                .await
                .map_err(|e| TransactionError::DatabaseError(e.to_string()))?
                .ok_or(TransactionError::CategoryNotFound)?;
        }

        Ok(())
    }
}

#[async_trait]
impl TransactionService for TransactionServiceImpl {
    async fn create(
        &self,
        auth: &AuthenticatedUser,
        request: TransactionRequest,
    ) -> Result<Transaction, TransactionError> {
        self.validate_request(auth, &request).await?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: auth.user_id,
            kind: request.kind,
            amount_cents: request.amount_cents,
            category_id: request.category_id,
            description: request.description,
            receipt_url: request.receipt_url,
            metadata: request.metadata,
            occurred_at: request.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: None,
        };

        Ok(self.transaction_repository.create(transaction).await?)
    }

    async fn get(
        &self,
        auth: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<Transaction, TransactionError> {
        self.transaction_repository
            .find_by_id(auth.visibility(), id)
            .await?
            .ok_or(TransactionError::NotFound)
    }

    async fn list(
        &self,
        auth: &AuthenticatedUser,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, TransactionError> {
        Ok(self
            .transaction_repository
            .list(auth.visibility(), query)
            .await?)
    }

    async fn update(
        &self,
        auth: &AuthenticatedUser,
        id: Uuid,
        request: TransactionRequest,
    ) -> Result<Transaction, TransactionError> {
        let existing = self.get(auth, id).await?;
        self.validate_request(auth, &request).await?;

        // Full replacement; identity and creation time are preserved.
        // An omitted occurred_at resets to now, same as on create.
        let transaction = Transaction {
            kind: request.kind,
            amount_cents: request.amount_cents,
            category_id: request.category_id,
            description: request.description,
            receipt_url: request.receipt_url,
            metadata: request.metadata,
            occurred_at: request.occurred_at.unwrap_or_else(Utc::now),
            ..existing
        };

        Ok(self.transaction_repository.update(transaction).await?)
    }

    async fn delete(&self, auth: &AuthenticatedUser, id: Uuid) -> Result<(), TransactionError> {
        Ok(self
            .transaction_repository
            .delete(auth.visibility(), id)
            .await?)
    }

    async fn aggregate(
        &self,
        auth: &AuthenticatedUser,
        query: &AggregateQuery,
    ) -> Result<AggregateResponse, TransactionError> {
        let filter = query.into();

        let rows = match query.group_by {
            GroupBy::Category => {
                let mut rows = self
                    .transaction_repository
                    .aggregate_by_category(auth.visibility(), &filter)
                    .await?;
                for row in &mut rows {
                    if row.category_id.is_none() {
                        row.category_name = Some("Uncategorized".to_string());
                    }
                }
                AggregateRows::Category(rows)
            }
            GroupBy::Period => {
                let rows = self
                    .transaction_repository
                    .aggregate_by_period(auth.visibility(), query.period, &filter)
                    .await?;
                AggregateRows::Period(
                    rows.into_iter()
                        .map(|row| PeriodAggregate {
                            period_start: row.period_start,
                            period_end: query.period.bucket_end(row.period_start),
                            kind: row.kind,
                            total_cents: row.total_cents,
                            count: row.count,
                        })
                        .collect(),
                )
            }
        };

        Ok(AggregateResponse {
            group_by: query.group_by,
            period: query.period,
            rows,
        })
    }
}
