//! Reseller API Library
//!
//! This crate provides the core functionality for the reseller management
//! API: customers, product catalog with stock, sales orders with profit
//! snapshots, supplier restock orders, CSV imports, and sales reports.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{extract::State, http::HeaderValue, response::Json, routing::get, Extension, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::AuthService;
use crate::config::AppConfig;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub services: Services,
}

/// Domain services shared across handlers
#[derive(Clone)]
pub struct Services {
    pub customers: Arc<services::CustomerService>,
    pub products: Arc<services::ProductService>,
    pub orders: Arc<services::OrderService>,
    pub supplier_orders: Arc<services::SupplierOrderService>,
    pub imports: Arc<services::ImportService>,
    pub reports: Arc<services::ReportService>,
}

impl Services {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            customers: Arc::new(services::CustomerService::new(db.clone())),
            products: Arc::new(services::ProductService::new(db.clone())),
            orders: Arc::new(services::OrderService::new(db.clone())),
            supplier_orders: Arc::new(services::SupplierOrderService::new(db.clone())),
            imports: Arc::new(services::ImportService::new(db.clone())),
            reports: Arc::new(services::ReportService::new(db)),
        }
    }
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        let services = Services::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Page of results plus pagination bookkeeping
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Protected domain routes mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/customers", handlers::customers::routes())
        .nest("/products", handlers::products::routes())
        .nest("/orders", handlers::orders::routes())
        .nest("/supplier-orders", handlers::supplier_orders::routes())
        .nest("/import", handlers::imports::routes())
        .nest("/reports", handlers::reports::routes())
}

/// Assembles the full application router.
///
/// `/auth` routes are public; everything under `/api/v1` goes through the
/// bearer-token middleware. The auth service rides along as an extension
/// so both the middleware and the auth handlers can reach it.
pub fn build_router(state: AppState, auth_service: Arc<AuthService>) -> Router {
    let cors = build_cors_layer(&state.config);

    let protected =
        api_v1_routes().route_layer(axum::middleware::from_fn(auth::auth_middleware));

    Router::new()
        .route("/", get(api_status))
        .route("/health", get(health_check))
        .nest("/api/v1", protected)
        .with_state(state)
        .nest("/auth", auth::auth_routes().with_state(auth_service.clone()))
        .layer(Extension(auth_service))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// CORS policy from configuration: explicit origins when given, permissive
/// otherwise (development or explicit override).
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    if let Some(raw) = &config.cors_allowed_origins {
        let origins: Vec<HeaderValue> = raw
            .split(',')
            .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
            .collect();
        if !origins.is_empty() {
            return CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any);
        }
    }

    if config.should_allow_permissive_cors() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "service": "reseller-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "database": db_status,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_response_computes_total_pages() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 45, 1, 20);
        assert_eq!(page.total_pages, 3);

        let page = PaginatedResponse::new(Vec::<i32>::new(), 40, 2, 20);
        assert_eq!(page.total_pages, 2);

        let page = PaginatedResponse::new(Vec::<i32>::new(), 0, 1, 20);
        assert_eq!(page.total_pages, 0);
    }
}
