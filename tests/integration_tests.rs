use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use envelope_budget::config::{AuthConfig, ResetConfig};
use envelope_budget::models::auth::Visibility;
use envelope_budget::models::category::Category;
use envelope_budget::models::filters::{
    CategoryAggregate, Period, SortBy, SortOrder, TransactionFilter, TransactionQuery,
};
use envelope_budget::models::password_reset::PasswordResetToken;
use envelope_budget::models::session::Session;
use envelope_budget::models::transaction::{Transaction, TransactionType};
use envelope_budget::models::user::{Role, User};
use envelope_budget::repositories::transaction_repository::PeriodRow;
use envelope_budget::repositories::{
    CategoryRepository, PasswordResetRepository, RepositoryError, SessionRepository,
    TransactionRepository, UserRepository,
};
use envelope_budget::routes;
use envelope_budget::security;
use envelope_budget::services::{
    AuthServiceImpl, CategoryServiceImpl, PasswordResetServiceImpl, TransactionServiceImpl,
};
use envelope_budget::state::AppState;

// ---------------------------------------------------------------------------
// In-memory repositories: the full router runs against these, so the
// tests cover routing, middleware, extraction, and service logic
// without a database.
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::ConstraintViolation(
                "Email already exists".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
struct InMemorySessions {
    sessions: Mutex<Vec<Session>>,
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn create(&self, session: Session) -> Result<Session, RepositoryError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }
}

struct InMemoryResets {
    tokens: Mutex<Vec<PasswordResetToken>>,
    users: Arc<InMemoryUsers>,
}

#[async_trait]
impl PasswordResetRepository for InMemoryResets {
    async fn create(
        &self,
        token: PasswordResetToken,
    ) -> Result<PasswordResetToken, RepositoryError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(token)
    }

    async fn find_valid(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>, RepositoryError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token_hash == token_hash && t.used_at.is_none() && t.expires_at > now)
            .cloned())
    }

    async fn redeem(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.lock().unwrap();
        let token = tokens
            .iter_mut()
            .find(|t| t.id == token_id && t.used_at.is_none())
            .ok_or(RepositoryError::NotFound)?;
        token.used_at = Some(Utc::now());

        let mut users = self.users.users.lock().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryCategories {
    categories: Mutex<HashMap<Uuid, Category>>,
}

#[async_trait]
impl CategoryRepository for InMemoryCategories {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        self.categories
            .lock()
            .unwrap()
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn find_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .values()
            .find(|c| c.user_id == user_id && c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list(
        &self,
        user_id: Uuid,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut result: Vec<Category> = self
            .categories
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id && kind.map_or(true, |k| c.kind == k))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(result)
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        let mut categories = self.categories.lock().unwrap();
        if !categories.contains_key(&category.id) {
            return Err(RepositoryError::NotFound);
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let mut categories = self.categories.lock().unwrap();
        match categories.get(&id) {
            Some(c) if c.user_id == user_id => {
                categories.remove(&id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

struct InMemoryTransactions {
    transactions: Mutex<Vec<Transaction>>,
    categories: Arc<InMemoryCategories>,
}

impl InMemoryTransactions {
    fn visible(visibility: Visibility, t: &Transaction) -> bool {
        match visibility {
            Visibility::All => true,
            Visibility::User(user_id) => t.user_id == user_id,
        }
    }

    fn matches(filter: &TransactionFilter, t: &Transaction) -> bool {
        filter.kind.map_or(true, |k| t.kind == k)
            && filter.category_id.map_or(true, |c| t.category_id == Some(c))
            && filter.start_date.map_or(true, |d| t.occurred_at >= d)
            && filter.end_date.map_or(true, |d| t.occurred_at <= d)
            && filter.min_amount.map_or(true, |a| t.amount_cents >= a)
            && filter.max_amount.map_or(true, |a| t.amount_cents <= a)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactions {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(transaction)
    }

    async fn find_by_id(
        &self,
        visibility: Visibility,
        id: Uuid,
    ) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && Self::visible(visibility, t))
            .cloned())
    }

    async fn list(
        &self,
        visibility: Visibility,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let filter = TransactionFilter::from(query);
        let mut result: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| Self::visible(visibility, t) && Self::matches(&filter, t))
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            let ordering = match query.sort_by() {
                SortBy::OccurredAt => a.occurred_at.cmp(&b.occurred_at),
                SortBy::AmountCents => a.amount_cents.cmp(&b.amount_cents),
                SortBy::CategoryId => a.category_id.cmp(&b.category_id),
            };
            match query.sort_order() {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(result
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn update(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let mut transactions = self.transactions.lock().unwrap();
        let slot = transactions
            .iter_mut()
            .find(|t| t.id == transaction.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = transaction.clone();
        Ok(transaction)
    }

    async fn delete(&self, visibility: Visibility, id: Uuid) -> Result<(), RepositoryError> {
        let mut transactions = self.transactions.lock().unwrap();
        let before = transactions.len();
        transactions.retain(|t| !(t.id == id && Self::visible(visibility, t)));
        if transactions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count_by_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<i64, RepositoryError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && t.category_id == Some(category_id))
            .count() as i64)
    }

    async fn aggregate_by_category(
        &self,
        visibility: Visibility,
        filter: &TransactionFilter,
    ) -> Result<Vec<CategoryAggregate>, RepositoryError> {
        let mut buckets: Vec<CategoryAggregate> = Vec::new();
        let categories = self.categories.categories.lock().unwrap();
        for t in self.transactions.lock().unwrap().iter() {
            if !Self::visible(visibility, t) || !Self::matches(filter, t) {
                continue;
            }
            match buckets
                .iter_mut()
                .find(|b| b.category_id == t.category_id && b.kind == t.kind)
            {
                Some(bucket) => {
                    bucket.total_cents += t.amount_cents;
                    bucket.count += 1;
                }
                None => buckets.push(CategoryAggregate {
                    category_id: t.category_id,
                    category_name: t
                        .category_id
                        .and_then(|id| categories.get(&id))
                        .map(|c| c.name.clone()),
                    kind: t.kind,
                    total_cents: t.amount_cents,
                    count: 1,
                }),
            }
        }
        buckets.sort_by(|a, b| b.total_cents.cmp(&a.total_cents));
        Ok(buckets)
    }

    async fn aggregate_by_period(
        &self,
        visibility: Visibility,
        period: Period,
        filter: &TransactionFilter,
    ) -> Result<Vec<PeriodRow>, RepositoryError> {
        let mut buckets: Vec<PeriodRow> = Vec::new();
        for t in self.transactions.lock().unwrap().iter() {
            if !Self::visible(visibility, t) || !Self::matches(filter, t) {
                continue;
            }
            let start = period.truncate(t.occurred_at);
            match buckets
                .iter_mut()
                .find(|b| b.period_start == start && b.kind == t.kind)
            {
                Some(bucket) => {
                    bucket.total_cents += t.amount_cents;
                    bucket.count += 1;
                }
                None => buckets.push(PeriodRow {
                    period_start: start,
                    kind: t.kind,
                    total_cents: t.amount_cents,
                    count: 1,
                }),
            }
        }
        buckets.sort_by_key(|b| (b.period_start, b.kind.as_str()));
        Ok(buckets)
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

struct TestApp {
    router: Router,
    users: Arc<InMemoryUsers>,
    resets: Arc<InMemoryResets>,
}

fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUsers::default());
    let sessions = Arc::new(InMemorySessions::default());
    let resets = Arc::new(InMemoryResets {
        tokens: Mutex::new(Vec::new()),
        users: users.clone(),
    });
    let categories = Arc::new(InMemoryCategories::default());
    let transactions = Arc::new(InMemoryTransactions {
        transactions: Mutex::new(Vec::new()),
        categories: categories.clone(),
    });

    let auth_config = AuthConfig {
        jwt_secret: "integration_test_secret".to_string(),
        access_token_minutes: 30,
        use_refresh_tokens: true,
        refresh_token_days: 30,
        bcrypt_cost: 4,
    };
    let reset_config = ResetConfig {
        reset_token_minutes: 60,
        bcrypt_cost: 4,
    };

    let state = AppState {
        auth: Arc::new(AuthServiceImpl::new(
            users.clone(),
            sessions,
            auth_config,
        )),
        password_reset: Arc::new(PasswordResetServiceImpl::new(
            users.clone(),
            resets.clone(),
            reset_config,
        )),
        categories: Arc::new(CategoryServiceImpl::new(
            categories.clone(),
            transactions.clone(),
        )),
        transactions: Arc::new(TransactionServiceImpl::new(transactions, categories)),
    };

    TestApp {
        router: routes::router(state),
        users,
        resets,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    json_request("POST", uri, Some(body), token)
}

fn json_request(
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn register_and_login(app: &TestApp, email: &str) -> String {
    let (status, body) = send(
        &app.router,
        post_json(
            "/api/register",
            json!({"email": email, "password": "password123"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["access_token"].as_str().unwrap().to_string()
}

async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let (status, body) = send(
        &app.router,
        post_json(
            "/api/login",
            json!({"email": email, "password": password}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_category(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    send(&app.router, post_json("/api/categories", body, Some(token))).await
}

async fn create_transaction(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    send(
        &app.router,
        post_json("/api/transactions", body, Some(token)),
    )
    .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_works() {
    let app = test_app();

    let (status, body) = send(&app.router, json_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_returns_tokens_and_lowercases_email() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/register",
            json!({"email": "New.User@Example.COM", "password": "password123", "first_name": "New"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token_type"], "bearer");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(body.get("password_hash").is_none());

    let stored = app
        .users
        .find_by_email("new.user@example.com")
        .await
        .unwrap()
        .expect("user stored under lowercased email");
    assert_eq!(stored.email, "new.user@example.com");
    assert_eq!(stored.role, Role::Student);
}

#[tokio::test]
async fn duplicate_registration_any_casing_conflicts() {
    let app = test_app();
    register_and_login(&app, "dup@example.com").await;

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/register",
            json!({"email": "DUP@example.com", "password": "password123"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_email");
}

#[tokio::test]
async fn register_validates_email_and_password_length() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/register",
            json!({"email": "not-an-email", "password": "short"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_yield_identical_errors() {
    let app = test_app();
    register_and_login(&app, "user@example.com").await;

    let (status_a, body_a) = send(
        &app.router,
        post_json(
            "/api/login",
            json!({"email": "user@example.com", "password": "wrongpassword"}),
            None,
        ),
    )
    .await;
    let (status_b, body_b) = send(
        &app.router,
        post_json(
            "/api/login",
            json!({"email": "ghost@example.com", "password": "password123"}),
            None,
        ),
    )
    .await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_a, status_b);
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn login_returns_refresh_token_when_enabled() {
    let app = test_app();
    register_and_login(&app, "user@example.com").await;

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/login",
            json!({"email": "user@example.com", "password": "password123"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 30 * 60);
    assert_eq!(body["refresh_token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app();

    for uri in ["/api/categories", "/api/transactions"] {
        let (status, body) = send(&app.router, json_request("GET", uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn category_crud_flow() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    let (status, created) = create_category(
        &app,
        &token,
        json!({"name": "Groceries", "type": "expense", "monthly_limit_cents": 50000}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    // case-insensitive duplicate
    let (status, body) =
        create_category(&app, &token, json!({"name": "groceries", "type": "expense"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_name");

    // fetch and update
    let (status, fetched) = send(
        &app.router,
        json_request("GET", &format!("/api/categories/{id}"), None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["monthly_limit_cents"], 50000);

    let (status, updated) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/categories/{id}"),
            Some(json!({"name": "Food", "type": "expense", "monthly_limit_cents": 60000})),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Food");
    assert_eq!(updated["monthly_limit_cents"], 60000);

    // delete
    let (status, _) = send(
        &app.router,
        json_request(
            "DELETE",
            &format!("/api/categories/{id}"),
            None,
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app.router,
        json_request("GET", &format!("/api/categories/{id}"), None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_monthly_limit_is_rejected() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    let (status, body) = create_category(
        &app,
        &token,
        json!({"name": "Broken", "type": "expense", "monthly_limit_cents": -1}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn default_category_cannot_be_deleted_or_renamed() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    let (status, created) = create_category(
        &app,
        &token,
        json!({"name": "General", "type": "expense", "is_default": true}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        json_request(
            "DELETE",
            &format!("/api/categories/{id}"),
            None,
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "default_undeletable");

    let (status, body) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/categories/{id}"),
            Some(json!({"name": "Renamed", "type": "expense"})),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "default_immutable");

    // monthly limit stays updatable
    let (status, updated) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/categories/{id}"),
            Some(json!({"name": "General", "type": "expense", "monthly_limit_cents": 12345})),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["monthly_limit_cents"], 12345);
}

#[tokio::test]
async fn referenced_category_delete_names_the_count() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    let (_, category) =
        create_category(&app, &token, json!({"name": "Food", "type": "expense"})).await;
    let category_id = category["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, _) = create_transaction(
            &app,
            &token,
            json!({"type": "expense", "amount_cents": 1000, "category_id": category_id}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app.router,
        json_request(
            "DELETE",
            &format!("/api/categories/{category_id}"),
            None,
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "category_in_use");
    assert!(body["message"].as_str().unwrap().contains('2'));
}

#[tokio::test]
async fn transaction_validation_rules() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    // non-positive amount
    let (status, body) =
        create_transaction(&app, &token, json!({"type": "expense", "amount_cents": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // future occurrence
    let future = (Utc::now() + Duration::days(1)).to_rfc3339();
    let (status, body) = create_transaction(
        &app,
        &token,
        json!({"type": "expense", "amount_cents": 100, "occurred_at": future}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "future_date");

    // another user's category reads as missing
    let other_token = register_and_login(&app, "other@example.com").await;
    let (_, category) =
        create_category(&app, &other_token, json!({"name": "Theirs", "type": "expense"})).await;
    let (status, body) = create_transaction(
        &app,
        &token,
        json!({
            "type": "expense",
            "amount_cents": 100,
            "category_id": category["id"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "category_not_found");
}

#[tokio::test]
async fn transactions_filter_sort_and_paginate() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    for amount in [500, 100, 300, 200, 400] {
        let (status, _) = create_transaction(
            &app,
            &token,
            json!({"type": "expense", "amount_cents": amount}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app.router,
        json_request(
            "GET",
            "/api/transactions?min_amount=150&sort_by=amount_cents&sort_order=asc&page=1&limit=2",
            None,
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let amounts: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["amount_cents"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts, [200, 300]);

    // page 2 of the same query
    let (_, body) = send(
        &app.router,
        json_request(
            "GET",
            "/api/transactions?min_amount=150&sort_by=amount_cents&sort_order=asc&page=2&limit=2",
            None,
            Some(&token),
        ),
    )
    .await;
    let amounts: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["amount_cents"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts, [400, 500]);

    // limit out of range, both ends
    for uri in ["/api/transactions?limit=500", "/api/transactions?limit=0"] {
        let (status, body) = send(&app.router, json_request("GET", uri, None, Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn students_cannot_reach_each_others_transactions() {
    let app = test_app();
    let token_a = register_and_login(&app, "a@example.com").await;
    let token_b = register_and_login(&app, "b@example.com").await;

    let (_, created) = create_transaction(
        &app,
        &token_a,
        json!({"type": "expense", "amount_cents": 100}),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    for method in ["GET", "PUT", "DELETE"] {
        let body = (method == "PUT")
            .then(|| json!({"type": "expense", "amount_cents": 200}));
        let (status, _) = send(
            &app.router,
            json_request(
                method,
                &format!("/api/transactions/{id}"),
                body,
                Some(&token_b),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} should 404");
    }
}

#[tokio::test]
async fn admin_sees_all_transactions() {
    let app = test_app();
    let student_token = register_and_login(&app, "student@example.com").await;
    create_transaction(
        &app,
        &student_token,
        json!({"type": "expense", "amount_cents": 100}),
    )
    .await;

    // Admin accounts are provisioned out of band
    let admin = User {
        id: Uuid::new_v4(),
        email: "admin@example.com".to_string(),
        password_hash: security::hash_password("adminpassword", 4).unwrap(),
        first_name: None,
        last_name: None,
        role: Role::Admin,
        created_at: Utc::now(),
        updated_at: None,
    };
    app.users.create(admin).await.unwrap();
    let admin_token = login(&app, "admin@example.com", "adminpassword").await;

    let (status, body) = send(
        &app.router,
        json_request("GET", "/api/transactions", None, Some(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app.router,
        json_request("GET", "/api/transactions", None, Some(&student_token)),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn aggregates_group_by_category_with_uncategorized() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    let (_, category) =
        create_category(&app, &token, json!({"name": "Food", "type": "expense"})).await;
    create_transaction(
        &app,
        &token,
        json!({"type": "expense", "amount_cents": 1500, "category_id": category["id"]}),
    )
    .await;
    create_transaction(&app, &token, json!({"type": "expense", "amount_cents": 700})).await;

    let (status, body) = send(
        &app.router,
        json_request(
            "GET",
            "/api/transactions/aggregates?group_by=category",
            None,
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_by"], "category");
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["category_name"], "Food");
    assert_eq!(rows[0]["total_cents"], 1500);
    assert_eq!(rows[1]["category_name"], "Uncategorized");
    assert_eq!(rows[1]["total_cents"], 700);
}

#[tokio::test]
async fn monthly_aggregates_cross_year_boundary() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    for (date, amount) in [
        ("2024-12-05T10:00:00Z", 1000),
        ("2024-12-28T10:00:00Z", 500),
        ("2025-01-02T10:00:00Z", 250),
    ] {
        let (status, _) = create_transaction(
            &app,
            &token,
            json!({"type": "expense", "amount_cents": amount, "occurred_at": date}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app.router,
        json_request(
            "GET",
            "/api/transactions/aggregates?group_by=period&period=monthly",
            None,
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let december = &rows[0];
    assert_eq!(december["total_cents"], 1500);
    assert_eq!(december["count"], 2);
    let end: DateTime<Utc> = december["period_end"].as_str().unwrap().parse().unwrap();
    assert_eq!(end, Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap());

    let january = &rows[1];
    let end: DateTime<Utc> = january["period_end"].as_str().unwrap().parse().unwrap();
    assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap());
}

#[tokio::test]
async fn period_aggregates_report_income_and_expense_separately() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;

    for (kind, amount) in [("income", 5000), ("expense", 1200)] {
        let (status, _) = create_transaction(
            &app,
            &token,
            json!({
                "type": kind,
                "amount_cents": amount,
                "occurred_at": "2024-06-10T09:00:00Z"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app.router,
        json_request(
            "GET",
            "/api/transactions/aggregates?group_by=period&period=monthly",
            None,
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], "expense");
    assert_eq!(rows[0]["total_cents"], 1200);
    assert_eq!(rows[1]["type"], "income");
    assert_eq!(rows[1]["total_cents"], 5000);
    assert_eq!(rows[0]["period_start"], rows[1]["period_start"]);
}

#[tokio::test]
async fn aggregate_defaults_to_category_and_monthly() {
    let app = test_app();
    let token = register_and_login(&app, "user@example.com").await;
    create_transaction(&app, &token, json!({"type": "expense", "amount_cents": 700})).await;

    let (status, body) = send(
        &app.router,
        json_request("GET", "/api/transactions/aggregates", None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_by"], "category");
    assert_eq!(body["period"], "monthly");

    // group_by=period without an explicit period falls back to monthly
    let (status, body) = send(
        &app.router,
        json_request(
            "GET",
            "/api/transactions/aggregates?group_by=period",
            None,
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period"], "monthly");
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn password_reset_request_never_reveals_accounts() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/password_reset",
            json!({"email": "ghost@example.com"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(app.resets.tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn password_reset_flow_is_single_use() {
    let app = test_app();
    register_and_login(&app, "user@example.com").await;

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/password_reset",
            json!({"email": "user@example.com"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(app.resets.tokens.lock().unwrap().len(), 1);

    // The raw token is only ever logged; plant one the test controls
    let raw = security::generate_token();
    let user_id = app
        .users
        .find_by_email("user@example.com")
        .await
        .unwrap()
        .unwrap()
        .id;
    let now = Utc::now();
    app.resets
        .create(PasswordResetToken {
            id: Uuid::new_v4(),
            user_id,
            token_hash: security::hash_token(&raw),
            expires_at: now + Duration::minutes(60),
            used_at: None,
            created_at: now,
        })
        .await
        .unwrap();

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/password_reset/confirm",
            json!({"token": raw, "new_password": "brand-new-pass"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    // old password no longer works, new one does
    let (status, _) = send(
        &app.router,
        post_json(
            "/api/login",
            json!({"email": "user@example.com", "password": "password123"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login(&app, "user@example.com", "brand-new-pass").await;

    // token cannot be spent twice
    let (status, body) = send(
        &app.router,
        post_json(
            "/api/password_reset/confirm",
            json!({"token": raw, "new_password": "yet-another-pass"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn reset_confirm_validates_password_length() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json(
            "/api/password_reset/confirm",
            json!({"token": "whatever", "new_password": "short"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}
