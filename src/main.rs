use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use envelope_budget::config::AppConfig;
use envelope_budget::repositories::{
    PostgresCategoryRepository, PostgresPasswordResetRepository, PostgresSessionRepository,
    PostgresTransactionRepository, PostgresUserRepository,
};
use envelope_budget::routes;
use envelope_budget::services::{
    AuthServiceImpl, CategoryServiceImpl, PasswordResetServiceImpl, TransactionServiceImpl,
};
use envelope_budget::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "envelope_budget=debug,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Create database connection pool; failure here is fatal
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    tracing::info!("connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations completed");

    // Initialize repositories
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let session_repository = Arc::new(PostgresSessionRepository::new(pool.clone()));
    let reset_repository = Arc::new(PostgresPasswordResetRepository::new(pool.clone()));
    let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let transaction_repository = Arc::new(PostgresTransactionRepository::new(pool.clone()));

    // Initialize services
    let state = AppState {
        auth: Arc::new(AuthServiceImpl::new(
            user_repository.clone(),
            session_repository,
            config.auth(),
        )),
        password_reset: Arc::new(PasswordResetServiceImpl::new(
            user_repository,
            reset_repository,
            config.reset(),
        )),
        categories: Arc::new(CategoryServiceImpl::new(
            category_repository.clone(),
            transaction_repository.clone(),
        )),
        transactions: Arc::new(TransactionServiceImpl::new(
            transaction_repository,
            category_repository,
        )),
    };

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server running");
    tracing::info!("API docs at http://{addr}/api/docs");

    axum::serve(listener, app).await?;

    Ok(())
}
