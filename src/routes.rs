use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::auth_handlers::{login_handler, register_handler};
use crate::handlers::category_handlers::{
    create_category_handler, delete_category_handler, get_category_handler,
    list_categories_handler, update_category_handler,
};
use crate::handlers::password_reset_handlers::{confirm_reset_handler, request_reset_handler};
use crate::handlers::transaction_handlers::{
    aggregate_transactions_handler, create_transaction_handler, delete_transaction_handler,
    get_transaction_handler, list_transactions_handler, update_transaction_handler,
};
use crate::handlers::ErrorResponse;
use crate::middleware::require_auth;
use crate::models::{
    AggregateResponse, AggregateRows, Category, CategoryAggregate, CategoryRequest, GroupBy,
    LoginRequest, OkResponse, PasswordResetConfirm, PasswordResetRequest, Period, PeriodAggregate,
    RegisterRequest, SortBy, SortOrder, TokenResponse, Transaction, TransactionRequest,
    TransactionType,
};
use crate::state::AppState;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth_handlers::register_handler,
        crate::handlers::auth_handlers::login_handler,
        crate::handlers::password_reset_handlers::request_reset_handler,
        crate::handlers::password_reset_handlers::confirm_reset_handler,
        crate::handlers::category_handlers::create_category_handler,
        crate::handlers::category_handlers::list_categories_handler,
        crate::handlers::category_handlers::get_category_handler,
        crate::handlers::category_handlers::update_category_handler,
        crate::handlers::category_handlers::delete_category_handler,
        crate::handlers::transaction_handlers::create_transaction_handler,
        crate::handlers::transaction_handlers::list_transactions_handler,
        crate::handlers::transaction_handlers::aggregate_transactions_handler,
        crate::handlers::transaction_handlers::get_transaction_handler,
        crate::handlers::transaction_handlers::update_transaction_handler,
        crate::handlers::transaction_handlers::delete_transaction_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, TokenResponse,
            PasswordResetRequest, PasswordResetConfirm, OkResponse,
            Category, CategoryRequest, TransactionType,
            Transaction, TransactionRequest, SortBy, SortOrder,
            AggregateResponse, AggregateRows, CategoryAggregate, PeriodAggregate,
            GroupBy, Period,
            ErrorResponse
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "password_reset", description = "Password reset flow"),
        (name = "categories", description = "Budget envelope categories"),
        (name = "transactions", description = "Income and expense records")
    ),
    info(
        title = "Envelope Budget API",
        version = "0.1.0",
        description = "REST API for envelope-style personal budgeting",
    )
)]
struct ApiDoc;

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the full application router. Category and transaction routes
/// sit behind the bearer-token middleware; auth and reset routes are
/// public.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/categories",
            post(create_category_handler).get(list_categories_handler),
        )
        .route(
            "/api/categories/:id",
            get(get_category_handler)
                .put(update_category_handler)
                .delete(delete_category_handler),
        )
        .route(
            "/api/transactions",
            post(create_transaction_handler).get(list_transactions_handler),
        )
        .route(
            "/api/transactions/aggregates",
            get(aggregate_transactions_handler),
        )
        .route(
            "/api/transactions/:id",
            get(get_transaction_handler)
                .put(update_transaction_handler)
                .delete(delete_transaction_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        .route("/api/password_reset", post(request_reset_handler))
        .route("/api/password_reset/confirm", post(confirm_reset_handler))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
