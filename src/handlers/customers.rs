use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::PaginationParams;
use crate::auth::AuthUser;
use crate::entities::customer;
use crate::errors::ServiceError;
use crate::services::customers::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::{AppState, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<customer::Model>), ServiceError> {
    let created = state
        .services
        .customers
        .create_customer(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<customer::Model>>, ServiceError> {
    let (page, per_page) = params.normalized();
    let (customers, total) = state
        .services
        .customers
        .list_customers(user.user_id, page, per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(customers, total, page, per_page)))
}

async fn get_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<customer::Model>, ServiceError> {
    let found = state
        .services
        .customers
        .get_customer(user.user_id, id)
        .await?;
    Ok(Json(found))
}

async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<customer::Model>, ServiceError> {
    let updated = state
        .services
        .customers
        .update_customer(user.user_id, id, request)
        .await?;
    Ok(Json(updated))
}

async fn delete_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .customers
        .delete_customer(user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
