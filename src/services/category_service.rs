use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::auth::AuthenticatedUser;
use crate::models::category::{Category, CategoryRequest};
use crate::models::transaction::TransactionType;
use crate::repositories::{CategoryRepository, RepositoryError, TransactionRepository};

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category name already exists")]
    DuplicateName,

    #[error("Category not found")]
    NotFound,

    #[error("Default category name and type cannot be changed")]
    DefaultImmutable,

    #[error("Default category cannot be deleted")]
    DefaultUndeletable,

    #[error("Category is referenced by {0} transaction(s)")]
    InUse(i64),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => CategoryError::NotFound,
            RepositoryError::ConstraintViolation(_) => CategoryError::DuplicateName,
            RepositoryError::DatabaseError(msg) => CategoryError::DatabaseError(msg),
        }
    }
}

/// Trait defining category service operations. Every operation is
/// scoped to the calling user; another user's category is a 404.
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Create a new category
    async fn create(
        &self,
        auth: &AuthenticatedUser,
        request: CategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// List the caller's categories, optionally filtered by type
    async fn list(
        &self,
        auth: &AuthenticatedUser,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, CategoryError>;

    /// Fetch one category by ID
    async fn get(&self, auth: &AuthenticatedUser, id: Uuid) -> Result<Category, CategoryError>;

    /// Replace a category. A default category only accepts changes to
    /// its monthly limit.
    async fn update(
        &self,
        auth: &AuthenticatedUser,
        id: Uuid,
        request: CategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Delete a category unless it is the default or still referenced
    /// by transactions
    async fn delete(&self, auth: &AuthenticatedUser, id: Uuid) -> Result<(), CategoryError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
    transaction_repository: Arc<dyn TransactionRepository>,
}

impl CategoryServiceImpl {
    pub fn new(
        category_repository: Arc<dyn CategoryRepository>,
        transaction_repository: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            category_repository,
            transaction_repository,
        }
    }

    /// Duplicate-name check, optionally excluding one category so an
    /// update can keep its own name.
    async fn ensure_name_free(
        &self,
        user_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), CategoryError> {
        if let Some(existing) = self.category_repository.find_by_name(user_id, name).await? {
            if Some(existing.id) != exclude {
                return Err(CategoryError::DuplicateName);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn create(
        &self,
        auth: &AuthenticatedUser,
        request: CategoryRequest,
    ) -> Result<Category, CategoryError> {
        self.ensure_name_free(auth.user_id, &request.name, None)
            .await?;

        let category = Category {
            id: Uuid::new_v4(),
            user_id: auth.user_id,
            name: request.name,
            kind: request.kind,
            monthly_limit_cents: request.monthly_limit_cents,
            is_default: request.is_default,
            created_at: Utc::now(),
        };

        Ok(self.category_repository.create(category).await?)
    }

    async fn list(
        &self,
        auth: &AuthenticatedUser,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, CategoryError> {
        Ok(self.category_repository.list(auth.user_id, kind).await?)
    }

    async fn get(&self, auth: &AuthenticatedUser, id: Uuid) -> Result<Category, CategoryError> {
        self.category_repository
            .find_by_id(auth.user_id, id)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    async fn update(
        &self,
        auth: &AuthenticatedUser,
        id: Uuid,
        request: CategoryRequest,
    ) -> Result<Category, CategoryError> {
        let existing = self.get(auth, id).await?;

        if existing.is_default
            && (request.name != existing.name || request.kind != existing.kind)
        {
            return Err(CategoryError::DefaultImmutable);
        }

        self.ensure_name_free(auth.user_id, &request.name, Some(id))
            .await?;

        let category = Category {
            name: request.name,
            kind: request.kind,
            monthly_limit_cents: request.monthly_limit_cents,
            ..existing
        };

        Ok(self.category_repository.update(category).await?)
    }

    async fn delete(&self, auth: &AuthenticatedUser, id: Uuid) -> Result<(), CategoryError> {
        let existing = self.get(auth, id).await?;

        if existing.is_default {
            return Err(CategoryError::DefaultUndeletable);
        }

        let references = self
            .transaction_repository
            .count_by_category(auth.user_id, id)
            .await?;
        if references > 0 {
            return Err(CategoryError::InUse(references));
        }

        Ok(self
            .category_repository
            .delete(auth.user_id, id)
            .await?)
    }
}
