//! Query parameters for listing and aggregating transactions.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::transaction::TransactionType;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    50
}

/// Sort key for transaction listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    OccurredAt,
    AmountCents,
    CategoryId,
}

impl SortBy {
    /// Column name used in ORDER BY. Whitelisted here so no request
    /// value is ever interpolated into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            SortBy::OccurredAt => "occurred_at",
            SortBy::AmountCents => "amount_cents",
            SortBy::CategoryId => "category_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter and pagination parameters for `GET /api/transactions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,

    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: i64,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: i64,
}

impl TransactionQuery {
    pub fn sort_by(&self) -> SortBy {
        self.sort_by.unwrap_or(SortBy::OccurredAt)
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or(SortOrder::Desc)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Category,
    Period,
}

/// Calendar bucket size for period aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Period {
    /// Argument for Postgres `date_trunc`.
    pub fn date_trunc_field(&self) -> &'static str {
        match self {
            Period::Weekly => "week",
            Period::Monthly => "month",
            Period::Yearly => "year",
        }
    }

    /// Start of the bucket containing `ts`. Weeks start on Monday,
    /// matching Postgres `date_trunc('week', ...)`.
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let start = match self {
            Period::Weekly => {
                let days_from_monday = date.weekday().num_days_from_monday() as i64;
                date - Duration::days(days_from_monday)
            }
            Period::Monthly => date.with_day(1).unwrap_or(date),
            Period::Yearly => {
                let first = date.with_day(1).unwrap_or(date);
                first.with_month(1).unwrap_or(first)
            }
        };
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    /// Inclusive end of the bucket starting at `start`: the last day of
    /// the week, month, or year at midnight.
    pub fn bucket_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        let date = start.date_naive();
        let end = match self {
            Period::Weekly => date + Duration::days(6),
            Period::Monthly => {
                let (next_year, next_month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                let first_of_next = date
                    .with_year(next_year)
                    .and_then(|d| d.with_month(next_month))
                    .unwrap_or(date);
                first_of_next - Duration::days(1)
            }
            Period::Yearly => {
                let dec = date.with_month(12).unwrap_or(date);
                dec.with_day(31).unwrap_or(dec)
            }
        };
        Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

/// Parameters for `GET /api/transactions/aggregates`. Carries the same
/// filters as listing, minus sorting and pagination. `group_by` defaults
/// to category and `period` to monthly.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AggregateQuery {
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default)]
    pub period: Period,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
}

/// Filter subset shared by listing and aggregation queries, passed down
/// to the repository layer.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
}

impl From<&TransactionQuery> for TransactionFilter {
    fn from(q: &TransactionQuery) -> Self {
        TransactionFilter {
            kind: q.kind,
            category_id: q.category_id,
            start_date: q.start_date,
            end_date: q.end_date,
            min_amount: q.min_amount,
            max_amount: q.max_amount,
        }
    }
}

impl From<&AggregateQuery> for TransactionFilter {
    fn from(q: &AggregateQuery) -> Self {
        TransactionFilter {
            kind: q.kind,
            category_id: q.category_id,
            start_date: q.start_date,
            end_date: q.end_date,
            min_amount: q.min_amount,
            max_amount: q.max_amount,
        }
    }
}

/// One row of a per-category aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CategoryAggregate {
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub total_cents: i64,
    pub count: i64,
}

/// One row of a per-period aggregation, one per (bucket, type) pair.
/// `period_end` is the inclusive calendar end of the bucket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeriodAggregate {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub total_cents: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AggregateRows {
    Category(Vec<CategoryAggregate>),
    Period(Vec<PeriodAggregate>),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AggregateResponse {
    pub group_by: GroupBy,
    pub period: Period,
    pub rows: AggregateRows,
}
