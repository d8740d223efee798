use axum::{extract::State, routing::post, Json, Router};

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::imports::ImportReport;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(import_customers))
        .route("/products", post(import_products))
}

/// Accepts the raw semicolon-CSV file as the request body.
async fn import_customers(
    State(state): State<AppState>,
    user: AuthUser,
    body: String,
) -> Result<Json<ImportReport>, ServiceError> {
    let report = state
        .services
        .imports
        .import_customers(user.user_id, &body)
        .await?;
    Ok(Json(report))
}

async fn import_products(
    State(state): State<AppState>,
    user: AuthUser,
    body: String,
) -> Result<Json<ImportReport>, ServiceError> {
    let report = state
        .services
        .imports
        .import_products(user.user_id, &body)
        .await?;
    Ok(Json(report))
}
