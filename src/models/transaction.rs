use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Transaction direction. Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

/// Ledger entry. Amounts are integer cents and always positive;
/// the direction lives in `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount_cents: i64,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request payload for creating or replacing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "type": "expense",
    "amount_cents": 1250,
    "category_id": "7f1b1c1e-9f7a-4a6e-8a7e-2f4b9d3c5a10",
    "description": "Lunch",
    "occurred_at": "2024-11-04T12:30:00Z"
}))]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionType,

    #[validate(range(min = 1, message = "Amount must be a positive number of cents"))]
    pub amount_cents: i64,

    pub category_id: Option<Uuid>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Receipt URL must be a valid URL"))]
    pub receipt_url: Option<String>,

    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,

    /// Defaults to the current time when omitted. Must not be in the future.
    pub occurred_at: Option<DateTime<Utc>>,
}
