use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::handlers::ErrorResponse;
use crate::services::auth_service::{AuthError, AuthService};

/// Middleware that validates the bearer access token and stores the
/// resolved `AuthenticatedUser` in request extensions for handlers.
pub async fn require_auth(
    State(auth_service): State<Arc<dyn AuthService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthMiddlewareError::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthMiddlewareError::InvalidTokenFormat)?;

    let user = auth_service
        .authenticate(token)
        .await
        .map_err(|e| match e {
            AuthError::TokenExpired => AuthMiddlewareError::TokenExpired,
            _ => AuthMiddlewareError::InvalidToken,
        })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Auth middleware errors
#[derive(Debug)]
pub enum AuthMiddlewareError {
    MissingToken,
    InvalidTokenFormat,
    InvalidToken,
    TokenExpired,
}

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthMiddlewareError::MissingToken => "Missing authorization token",
            AuthMiddlewareError::InvalidTokenFormat => {
                "Invalid authorization header format. Expected: Bearer <token>"
            }
            AuthMiddlewareError::InvalidToken => "Invalid or malformed token",
            AuthMiddlewareError::TokenExpired => "Token has expired",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthorized", message)),
        )
            .into_response()
    }
}
