use axum::extract::FromRef;
use std::sync::Arc;

use crate::services::{AuthService, CategoryService, PasswordResetService, TransactionService};

/// Shared application state: one trait object per service, cheap to
/// clone per request.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub password_reset: Arc<dyn PasswordResetService>,
    pub categories: Arc<dyn CategoryService>,
    pub transactions: Arc<dyn TransactionService>,
}
