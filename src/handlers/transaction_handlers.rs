use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::{check_valid, ErrorResponse};
use crate::models::auth::AuthenticatedUser;
use crate::models::filters::{AggregateQuery, AggregateResponse, TransactionQuery};
use crate::models::transaction::{Transaction, TransactionRequest};
use crate::services::transaction_service::{TransactionError, TransactionService};

/// Convert TransactionError to HTTP response
impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            TransactionError::InvalidAmount => (
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                "Amount must be a positive number of cents",
            ),
            TransactionError::FutureDate => (
                StatusCode::BAD_REQUEST,
                "future_date",
                "Occurrence time cannot be in the future",
            ),
            TransactionError::CategoryNotFound => (
                StatusCode::NOT_FOUND,
                "category_not_found",
                "Category not found",
            ),
            TransactionError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Transaction not found",
            ),
            TransactionError::DatabaseError(ref msg) => {
                tracing::error!(error = %msg, "transaction database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Internal server error",
                )
            }
        };

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

/// Handler for recording a transaction
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = Transaction),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn create_transaction_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), Response> {
    check_valid(&request)?;

    match transaction_service.create(&user, request).await {
        Ok(transaction) => Ok((StatusCode::CREATED, Json(transaction))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for listing transactions with filters, sorting and
/// pagination
#[utoipa::path(
    get,
    path = "/api/transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Matching transactions", body = [Transaction]),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn list_transactions_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, Response> {
    check_valid(&query)?;

    match transaction_service.list(&user, &query).await {
        Ok(transactions) => Ok(Json(transactions)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for aggregating transactions by category or period
#[utoipa::path(
    get,
    path = "/api/transactions/aggregates",
    params(AggregateQuery),
    responses(
        (status = 200, description = "Aggregated totals", body = AggregateResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn aggregate_transactions_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<AggregateResponse>, Response> {
    match transaction_service.aggregate(&user, &query).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching one transaction
#[utoipa::path(
    get,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction", body = Transaction),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn get_transaction_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, Response> {
    match transaction_service.get(&user, id).await {
        Ok(transaction) => Ok(Json(transaction)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for replacing a transaction
#[utoipa::path(
    put,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    request_body = TransactionRequest,
    responses(
        (status = 200, description = "Transaction updated", body = Transaction),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn update_transaction_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<Transaction>, Response> {
    check_valid(&request)?;

    match transaction_service.update(&user, id, request).await {
        Ok(transaction) => Ok(Json(transaction)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a transaction
#[utoipa::path(
    delete,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn delete_transaction_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    match transaction_service.delete(&user, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
