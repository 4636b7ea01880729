use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::handlers::{check_valid, ErrorResponse};
use crate::models::password_reset::{OkResponse, PasswordResetConfirm, PasswordResetRequest};
use crate::services::password_reset_service::{PasswordResetError, PasswordResetService};

/// Convert PasswordResetError to HTTP response
impl IntoResponse for PasswordResetError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            // Deliberately vague: the caller learns nothing about
            // which check failed.
            PasswordResetError::InvalidToken => (
                StatusCode::BAD_REQUEST,
                "invalid_token",
                "Invalid or expired token",
            ),
            PasswordResetError::DatabaseError(ref msg) => {
                tracing::error!(error = %msg, "password reset database error");
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

/// Handler for requesting a password reset
///
/// Always responds `{ok: true}` so the endpoint cannot be used to probe
/// which emails are registered.
#[utoipa::path(
    post,
    path = "/api/password_reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset requested", body = OkResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "password_reset"
)]
pub async fn request_reset_handler(
    State(reset_service): State<Arc<dyn PasswordResetService>>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<OkResponse>, Response> {
    check_valid(&request)?;

    match reset_service.request_reset(&request.email).await {
        Ok(()) => Ok(Json(OkResponse::ok())),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for confirming a password reset with a token
#[utoipa::path(
    post,
    path = "/api/password_reset/confirm",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password updated", body = OkResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "password_reset"
)]
pub async fn confirm_reset_handler(
    State(reset_service): State<Arc<dyn PasswordResetService>>,
    Json(request): Json<PasswordResetConfirm>,
) -> Result<Json<OkResponse>, Response> {
    check_valid(&request)?;

    match reset_service
        .confirm_reset(&request.token, &request.new_password)
        .await
    {
        Ok(()) => Ok(Json(OkResponse::ok())),
        Err(e) => Err(e.into_response()),
    }
}
