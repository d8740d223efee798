use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use super::PaginationParams;
use crate::auth::AuthUser;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::services::products::{CreateProductRequest, UpdateProductRequest};
use crate::{AppState, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_products)
                .post(create_product)
                .delete(delete_all_products),
        )
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<product::Model>), ServiceError> {
    let created = state
        .services
        .products
        .create_product(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<product::Model>>, ServiceError> {
    let (page, per_page) = params.normalized();
    let (products, total) = state
        .services
        .products
        .list_products(user.user_id, page, per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(products, total, page, per_page)))
}

async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<product::Model>, ServiceError> {
    let found = state.services.products.get_product(user.user_id, id).await?;
    Ok(Json(found))
}

async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<product::Model>, ServiceError> {
    let updated = state
        .services
        .products
        .update_product(user.user_id, id, request)
        .await?;
    Ok(Json(updated))
}

async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .products
        .delete_product(user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_all_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let deleted = state
        .services
        .products
        .delete_all_products(user.user_id)
        .await?;
    Ok(Json(json!({ "deleted_count": deleted })))
}
