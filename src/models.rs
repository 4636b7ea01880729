pub mod auth;
pub mod category;
pub mod filters;
pub mod password_reset;
pub mod session;
pub mod transaction;
pub mod user;

pub use auth::{AuthenticatedUser, LoginRequest, TokenResponse, Visibility};
pub use category::{Category, CategoryListQuery, CategoryRequest};
pub use filters::{
    AggregateQuery, AggregateResponse, AggregateRows, CategoryAggregate, GroupBy, Period,
    PeriodAggregate, SortBy, SortOrder, TransactionFilter, TransactionQuery,
};
pub use password_reset::{OkResponse, PasswordResetConfirm, PasswordResetRequest, PasswordResetToken};
pub use session::Session;
pub use transaction::{Transaction, TransactionRequest, TransactionType};
pub use user::{RegisterRequest, Role, User};
