use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::models::auth::Visibility;
use crate::models::filters::{CategoryAggregate, Period, TransactionFilter, TransactionQuery};
use crate::models::transaction::{Transaction, TransactionType};
use crate::repositories::RepositoryError;

/// One (period, type) bucket as returned by the database, before the
/// calendar end of the bucket is attached.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PeriodRow {
    pub period_start: DateTime<Utc>,
    pub kind: TransactionType,
    pub total_cents: i64,
    pub count: i64,
}

/// Trait defining transaction repository operations. Every read and
/// delete is scoped by a `Visibility`: admins see all rows, students
/// only their own.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Create a new transaction
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;

    /// Find a transaction by ID within the given visibility
    async fn find_by_id(
        &self,
        visibility: Visibility,
        id: Uuid,
    ) -> Result<Option<Transaction>, RepositoryError>;

    /// List transactions matching the query, sorted and paginated
    async fn list(
        &self,
        visibility: Visibility,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    /// Replace an existing transaction
    async fn update(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;

    /// Delete a transaction by ID within the given visibility
    async fn delete(&self, visibility: Visibility, id: Uuid) -> Result<(), RepositoryError>;

    /// Count transactions referencing a category, scoped to its owner
    async fn count_by_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<i64, RepositoryError>;

    /// Sum and count matching transactions grouped by category
    async fn aggregate_by_category(
        &self,
        visibility: Visibility,
        filter: &TransactionFilter,
    ) -> Result<Vec<CategoryAggregate>, RepositoryError>;

    /// Sum and count matching transactions grouped by calendar period
    async fn aggregate_by_period(
        &self,
        visibility: Visibility,
        period: Period,
        filter: &TransactionFilter,
    ) -> Result<Vec<PeriodRow>, RepositoryError>;
}

/// PostgreSQL implementation of TransactionRepository
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TRANSACTION_COLUMNS: &str = "id, user_id, kind, amount_cents, category_id, description, \
     receipt_url, metadata, occurred_at, created_at, updated_at";

/// Build WHERE conditions for a visibility scope plus optional filters.
/// Placeholders are numbered from `param_count`; bind values with
/// `bind_scope` in the same order.
fn scope_conditions(
    visibility: Visibility,
    filter: &TransactionFilter,
    prefix: &str,
    param_count: &mut usize,
) -> Vec<String> {
    let mut conditions = Vec::new();

    if let Visibility::User(_) = visibility {
        *param_count += 1;
        conditions.push(format!("{prefix}user_id = ${param_count}"));
    }
    if filter.kind.is_some() {
        *param_count += 1;
        conditions.push(format!("{prefix}kind = ${param_count}"));
    }
    if filter.category_id.is_some() {
        *param_count += 1;
        conditions.push(format!("{prefix}category_id = ${param_count}"));
    }
    if filter.start_date.is_some() {
        *param_count += 1;
        conditions.push(format!("{prefix}occurred_at >= ${param_count}"));
    }
    if filter.end_date.is_some() {
        *param_count += 1;
        conditions.push(format!("{prefix}occurred_at <= ${param_count}"));
    }
    if filter.min_amount.is_some() {
        *param_count += 1;
        conditions.push(format!("{prefix}amount_cents >= ${param_count}"));
    }
    if filter.max_amount.is_some() {
        *param_count += 1;
        conditions.push(format!("{prefix}amount_cents <= ${param_count}"));
    }

    conditions
}

/// Bind values in the exact order `scope_conditions` numbered them
fn bind_scope<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    visibility: Visibility,
    filter: &TransactionFilter,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    if let Visibility::User(user_id) = visibility {
        query = query.bind(user_id);
    }
    if let Some(kind) = filter.kind {
        query = query.bind(kind);
    }
    if let Some(category_id) = filter.category_id {
        query = query.bind(category_id);
    }
    if let Some(start_date) = filter.start_date {
        query = query.bind(start_date);
    }
    if let Some(end_date) = filter.end_date {
        query = query.bind(end_date);
    }
    if let Some(min_amount) = filter.min_amount {
        query = query.bind(min_amount);
    }
    if let Some(max_amount) = filter.max_amount {
        query = query.bind(max_amount);
    }
    query
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let sql = format!(
            "INSERT INTO transactions \
             (id, user_id, kind, amount_cents, category_id, description, receipt_url, metadata, occurred_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {TRANSACTION_COLUMNS}"
        );

        sqlx::query_as::<_, Transaction>(&sql)
            .bind(transaction.id)
            .bind(transaction.user_id)
            .bind(transaction.kind)
            .bind(transaction.amount_cents)
            .bind(transaction.category_id)
            .bind(&transaction.description)
            .bind(&transaction.receipt_url)
            .bind(&transaction.metadata)
            .bind(transaction.occurred_at)
            .bind(transaction.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn find_by_id(
        &self,
        visibility: Visibility,
        id: Uuid,
    ) -> Result<Option<Transaction>, RepositoryError> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1");
        if let Visibility::User(_) = visibility {
            sql.push_str(" AND user_id = $2");
        }

        let mut query = sqlx::query_as::<_, Transaction>(&sql).bind(id);
        if let Visibility::User(user_id) = visibility {
            query = query.bind(user_id);
        }

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn list(
        &self,
        visibility: Visibility,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let filter = TransactionFilter::from(query);
        let mut param_count = 0;
        let conditions = scope_conditions(visibility, &filter, "", &mut param_count);

        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        // Sort column and direction come from enum whitelists, never
        // from raw request text.
        sql.push_str(&format!(
            " ORDER BY {} {}, id ASC",
            query.sort_by().column(),
            query.sort_order().keyword()
        ));

        param_count += 1;
        sql.push_str(&format!(" LIMIT ${param_count}"));
        param_count += 1;
        sql.push_str(&format!(" OFFSET ${param_count}"));

        let sqlx_query = bind_scope(sqlx::query_as::<_, Transaction>(&sql), visibility, &filter)
            .bind(query.limit)
            .bind(query.offset());

        sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn update(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let sql = format!(
            "UPDATE transactions \
             SET kind = $1, amount_cents = $2, category_id = $3, description = $4, \
                 receipt_url = $5, metadata = $6, occurred_at = $7, updated_at = NOW() \
             WHERE id = $8 \
             RETURNING {TRANSACTION_COLUMNS}"
        );

        let result = sqlx::query_as::<_, Transaction>(&sql)
            .bind(transaction.kind)
            .bind(transaction.amount_cents)
            .bind(transaction.category_id)
            .bind(&transaction.description)
            .bind(&transaction.receipt_url)
            .bind(&transaction.metadata)
            .bind(transaction.occurred_at)
            .bind(transaction.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        result.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, visibility: Visibility, id: Uuid) -> Result<(), RepositoryError> {
        let mut sql = String::from("DELETE FROM transactions WHERE id = $1");
        if let Visibility::User(_) = visibility {
            sql.push_str(" AND user_id = $2");
        }

        let mut query = sqlx::query(&sql).bind(id);
        if let Visibility::User(user_id) = visibility {
            query = query.bind(user_id);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn count_by_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM transactions WHERE user_id = $1 AND category_id = $2",
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(count)
    }

    async fn aggregate_by_category(
        &self,
        visibility: Visibility,
        filter: &TransactionFilter,
    ) -> Result<Vec<CategoryAggregate>, RepositoryError> {
        let mut param_count = 0;
        let conditions = scope_conditions(visibility, filter, "t.", &mut param_count);

        // SUM over BIGINT yields NUMERIC; cast back so the row decodes
        // as i64.
        let mut sql = String::from(
            "SELECT t.category_id, c.name AS category_name, t.kind, \
             SUM(t.amount_cents)::BIGINT AS total_cents, COUNT(*) AS count \
             FROM transactions t \
             LEFT JOIN categories c ON c.id = t.category_id",
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" GROUP BY t.category_id, c.name, t.kind ORDER BY total_cents DESC");

        bind_scope(
            sqlx::query_as::<_, CategoryAggregate>(&sql),
            visibility,
            filter,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }

    async fn aggregate_by_period(
        &self,
        visibility: Visibility,
        period: Period,
        filter: &TransactionFilter,
    ) -> Result<Vec<PeriodRow>, RepositoryError> {
        let mut param_count = 0;
        let conditions = scope_conditions(visibility, filter, "", &mut param_count);

        let mut sql = format!(
            "SELECT date_trunc('{}', occurred_at) AS period_start, kind, \
             SUM(amount_cents)::BIGINT AS total_cents, COUNT(*) AS count \
             FROM transactions",
            period.date_trunc_field()
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" GROUP BY period_start, kind ORDER BY period_start ASC, kind ASC");

        bind_scope(sqlx::query_as::<_, PeriodRow>(&sql), visibility, filter)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))
    }
}
