use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::PaginationParams;
use crate::auth::AuthUser;
use crate::entities::order;
use crate::errors::ServiceError;
use crate::services::orders::{
    BulkUpdateStatusRequest, CreateOrderRequest, OrderResponse, UpdateOrderStatusRequest,
};
use crate::{AppState, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/bulk-status", post(bulk_update_status))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
}

async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ServiceError> {
    let created = state
        .services
        .orders
        .create_order(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<order::Model>>, ServiceError> {
    let (page, per_page) = params.normalized();
    let (orders, total) = state
        .services
        .orders
        .list_orders(user.user_id, page, per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(orders, total, page, per_page)))
}

async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let found = state.services.orders.get_order(user.user_id, id).await?;
    Ok(Json(found))
}

async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<order::Model>, ServiceError> {
    let updated = state
        .services
        .orders
        .update_order_status(user.user_id, id, request.status)
        .await?;
    Ok(Json(updated))
}

async fn bulk_update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<BulkUpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let updated = state
        .services
        .orders
        .bulk_update_status(user.user_id, request.ids, request.status)
        .await?;
    Ok(Json(json!({ "updated_count": updated })))
}
