pub mod auth_handlers;
pub mod category_handlers;
pub mod password_reset_handlers;
pub mod transaction_handlers;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Flatten validator output into one `field: message; ...` string
fn validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Run derive-based validation, mapping failures to a 400 response
pub(crate) fn check_valid<T: Validate>(request: &T) -> Result<(), Response> {
    request.validate().map_err(|errors| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "validation_error",
                &validation_message(&errors),
            )),
        )
            .into_response()
    })
}
