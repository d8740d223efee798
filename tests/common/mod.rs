use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use reseller_api::{
    auth::{AuthConfig, AuthService, RegisterRequest},
    config::AppConfig,
    db, AppState,
};

/// Helper harness spinning up the full router against a fresh
/// file-backed SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    pub user_id: Uuid,
    token: String,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state and a
    /// registered default user.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("reseller_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        // A single connection so every query sees the same SQLite file state.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let auth_service = Arc::new(AuthService::new(
            AuthConfig::from_app_config(&cfg),
            db_arc.clone(),
        ));

        let (account, token) = auth_service
            .register(RegisterRequest {
                email: "test@example.com".to_string(),
                name: "Test User".to_string(),
                password: "integration-password".to_string(),
            })
            .await
            .expect("register default test user");

        let state = AppState::new(db_arc, cfg);
        let router = reseller_api::build_router(state.clone(), auth_service.clone());

        Self {
            router,
            state,
            auth_service,
            user_id: account.id,
            token: token.access_token,
            _db_dir: db_dir,
        }
    }

    /// Access the bearer token for the default user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Registers an additional account, returning its id and token. Used
    /// by tests asserting per-user data isolation.
    pub async fn register_user(&self, email: &str) -> (Uuid, String) {
        let (account, token) = self
            .auth_service
            .register(RegisterRequest {
                email: email.to_string(),
                name: "Other User".to_string(),
                password: "integration-password".to_string(),
            })
            .await
            .expect("register extra test user");
        (account.id, token.access_token)
    }

    /// Send a JSON request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests as the default user.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Send a raw text body (CSV uploads) as the default user.
    pub async fn request_authenticated_text(
        &self,
        method: Method,
        uri: &str,
        body: &str,
    ) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token()))
            .header("content-type", "text/csv; charset=utf-8")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Creates a customer through the API and returns its id.
    pub async fn seed_customer(&self, name: &str, phone: &str) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/customers",
                Some(json!({ "name": name, "phone": phone })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        Uuid::parse_str(body["id"].as_str().expect("customer id")).expect("uuid")
    }

    /// Creates a product through the API and returns its id.
    pub async fn seed_product(
        &self,
        code: &str,
        cost_price: &str,
        sell_price: &str,
        stock_quantity: i32,
    ) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/products",
                Some(json!({
                    "code": code,
                    "name": format!("Product {}", code),
                    "cost_price": cost_price,
                    "sell_price": sell_price,
                    "stock_quantity": stock_quantity,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        Uuid::parse_str(body["id"].as_str().expect("product id")).expect("uuid")
    }
}

/// Reads a response body as JSON.
pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body as json")
}

/// Parses a JSON string field holding a decimal amount. Comparing parsed
/// decimals keeps assertions independent of trailing-zero formatting.
#[allow(dead_code)]
pub fn as_decimal(value: &Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .expect("decimal field serialized as string")
        .parse()
        .expect("parse decimal field")
}
