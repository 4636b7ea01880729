use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::transaction::TransactionType;
use crate::repositories::RepositoryError;

/// Trait defining category repository operations. All lookups are
/// scoped to the owning user.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Find a category by ID, scoped to one user
    async fn find_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Category>, RepositoryError>;

    /// Find a category by name, matched case-insensitively
    async fn find_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError>;

    /// List all categories for a user, optionally filtered by type.
    /// Default categories sort first, then alphabetically by name.
    async fn list(
        &self,
        user_id: Uuid,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, RepositoryError>;

    /// Replace an existing category
    async fn update(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Delete a category by ID
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CATEGORY_COLUMNS: &str =
    "id, user_id, name, kind, monthly_limit_cents, is_default, created_at";

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        let sql = format!(
            "INSERT INTO categories (id, user_id, name, kind, monthly_limit_cents, is_default, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {CATEGORY_COLUMNS}"
        );

        let result = sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(category.kind)
            .bind(category.monthly_limit_cents)
            .bind(category.is_default)
            .bind(category.created_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(category) => Ok(category),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                RepositoryError::ConstraintViolation("Category name already exists".to_string()),
            ),
            Err(e) => Err(RepositoryError::DatabaseError(e.to_string())),
        }
    }

    async fn find_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Category>, RepositoryError> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND user_id = $2");

        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn find_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE user_id = $1 AND lower(name) = lower($2)"
        );

        sqlx::query_as::<_, Category>(&sql)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn list(
        &self,
        user_id: Uuid,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = $1");
        if kind.is_some() {
            sql.push_str(" AND kind = $2");
        }
        sql.push_str(" ORDER BY is_default DESC, lower(name) ASC");

        let mut query = sqlx::query_as::<_, Category>(&sql).bind(user_id);
        if let Some(kind) = kind {
            query = query.bind(kind);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        let sql = format!(
            "UPDATE categories SET name = $1, kind = $2, monthly_limit_cents = $3 \
             WHERE id = $4 AND user_id = $5 \
             RETURNING {CATEGORY_COLUMNS}"
        );

        let result = sqlx::query_as::<_, Category>(&sql)
            .bind(&category.name)
            .bind(category.kind)
            .bind(category.monthly_limit_cents)
            .bind(category.id)
            .bind(category.user_id)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(category)) => Ok(category),
            Ok(None) => Err(RepositoryError::NotFound),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                RepositoryError::ConstraintViolation("Category name already exists".to_string()),
            ),
            Err(e) => Err(RepositoryError::DatabaseError(e.to_string())),
        }
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
