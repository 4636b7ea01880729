use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::transaction::TransactionType;
use crate::validation::validate_category_name;

/// Category ("envelope") entity: a named budget bucket with an optional
/// monthly spending limit. Names are unique per user, case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub monthly_limit_cents: Option<i64>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating or replacing a category.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Groceries",
    "type": "expense",
    "monthly_limit_cents": 50000
}))]
pub struct CategoryRequest {
    #[validate(
        custom(function = "validate_category_name"),
        length(max = 120, message = "Name must be at most 120 characters")
    )]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    #[validate(range(min = 0, message = "Monthly limit cannot be negative"))]
    pub monthly_limit_cents: Option<i64>,

    /// Only honoured on create; the default flag can never be changed later.
    #[serde(default)]
    pub is_default: bool,
}

/// Query parameters for listing categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}
