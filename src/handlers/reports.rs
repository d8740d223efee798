use axum::{extract::State, routing::get, Json, Router};

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::reports::SalesSummary;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/summary", get(sales_summary))
}

async fn sales_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SalesSummary>, ServiceError> {
    let summary = state.services.reports.sales_summary(user.user_id).await?;
    Ok(Json(summary))
}
