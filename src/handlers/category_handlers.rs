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
use crate::models::category::{Category, CategoryListQuery, CategoryRequest};
use crate::services::category_service::{CategoryError, CategoryService};

/// Convert CategoryError to HTTP response
impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            CategoryError::DuplicateName => (
                StatusCode::CONFLICT,
                "duplicate_name".to_string(),
                "Category name already exists".to_string(),
            ),
            CategoryError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found".to_string(),
                "Category not found".to_string(),
            ),
            CategoryError::DefaultImmutable => (
                StatusCode::CONFLICT,
                "default_immutable".to_string(),
                "Default category name and type cannot be changed".to_string(),
            ),
            CategoryError::DefaultUndeletable => (
                StatusCode::CONFLICT,
                "default_undeletable".to_string(),
                "Default category cannot be deleted".to_string(),
            ),
            CategoryError::InUse(count) => (
                StatusCode::CONFLICT,
                "category_in_use".to_string(),
                format!("Category is referenced by {count} transaction(s)"),
            ),
            CategoryError::DatabaseError(ref msg) => {
                tracing::error!(error = %msg, "category database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error".to_string(),
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(&error_type, &message))).into_response()
    }
}

/// Handler for creating a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Duplicate name", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), Response> {
    check_valid(&request)?;

    match category_service.create(&user, request).await {
        Ok(category) => Ok((StatusCode::CREATED, Json(category))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for listing the caller's categories
#[utoipa::path(
    get,
    path = "/api/categories",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "Categories for the caller", body = [Category]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<Category>>, Response> {
    match category_service.list(&user, query.kind).await {
        Ok(categories) => Ok(Json(categories)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for fetching one category
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn get_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, Response> {
    match category_service.get(&user, id).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for replacing a category
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Duplicate name or immutable default", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<Category>, Response> {
    check_valid(&request)?;

    match category_service.update(&user, id, request).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for deleting a category
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Default or still referenced", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    match category_service.delete(&user, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into_response()),
    }
}
