use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::PaginationParams;
use crate::auth::AuthUser;
use crate::entities::supplier_order;
use crate::errors::ServiceError;
use crate::services::supplier_orders::{CreateSupplierOrderRequest, SupplierOrderResponse};
use crate::{AppState, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_supplier_orders).post(create_supplier_order))
        .route("/:id", get(get_supplier_order).delete(delete_supplier_order))
        .route("/:id/receive", post(receive_supplier_order))
}

async fn create_supplier_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateSupplierOrderRequest>,
) -> Result<(StatusCode, Json<SupplierOrderResponse>), ServiceError> {
    let created = state
        .services
        .supplier_orders
        .create_supplier_order(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_supplier_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<supplier_order::Model>>, ServiceError> {
    let (page, per_page) = params.normalized();
    let (orders, total) = state
        .services
        .supplier_orders
        .list_supplier_orders(user.user_id, page, per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(orders, total, page, per_page)))
}

async fn get_supplier_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplierOrderResponse>, ServiceError> {
    let found = state
        .services
        .supplier_orders
        .get_supplier_order(user.user_id, id)
        .await?;
    Ok(Json(found))
}

async fn receive_supplier_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplierOrderResponse>, ServiceError> {
    let received = state
        .services
        .supplier_orders
        .receive_supplier_order(user.user_id, id)
        .await?;
    Ok(Json(received))
}

async fn delete_supplier_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .supplier_orders
        .delete_supplier_order(user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
