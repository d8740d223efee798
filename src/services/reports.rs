use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::order;
use crate::errors::ServiceError;

/// Service computing sales summaries for the dashboard.
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

/// Aggregates for one calendar month
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthlySummary {
    pub revenue: Decimal,
    pub profit: Decimal,
    pub order_count: u64,
}

/// Sales summary across all of a user's orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub order_count: u64,
    /// Keyed by `YYYY-MM`, sorted ascending.
    pub monthly: BTreeMap<String, MonthlySummary>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Totals revenue and profit over all of the user's orders, with a
    /// per-month breakdown by order date.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn sales_summary(&self, user_id: Uuid) -> Result<SalesSummary, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;

        let mut summary = SalesSummary {
            total_revenue: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            order_count: 0,
            monthly: BTreeMap::new(),
        };

        for order in orders {
            summary.total_revenue += order.total_amount;
            summary.total_profit += order.total_profit;
            summary.order_count += 1;

            let month = order.order_date.format("%Y-%m").to_string();
            let entry = summary.monthly.entry(month).or_default();
            entry.revenue += order.total_amount;
            entry.profit += order.total_profit;
            entry.order_count += 1;
        }

        Ok(summary)
    }
}
