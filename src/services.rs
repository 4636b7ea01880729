pub mod auth_service;
pub mod category_service;
pub mod password_reset_service;
pub mod transaction_service;

pub use auth_service::{AuthError, AuthService, AuthServiceImpl};
pub use category_service::{CategoryError, CategoryService, CategoryServiceImpl};
pub use password_reset_service::{
    PasswordResetError, PasswordResetService, PasswordResetServiceImpl,
};
pub use transaction_service::{TransactionError, TransactionService, TransactionServiceImpl};
