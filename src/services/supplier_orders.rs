use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::supplier_order::{self, SupplierOrderStatus};
use crate::entities::{product, supplier_order_item};
use crate::errors::ServiceError;

/// Service for restock orders placed with suppliers.
///
/// Receiving an order is the only path that increases stock: it flips the
/// order to completed, stamps the received date, and credits each linked
/// product's stock in one transaction. Free-form lines without a product
/// reference never touch stock.
pub struct SupplierOrderService {
    db: Arc<DatabaseConnection>,
}

/// A single line of a new supplier order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSupplierOrderItem {
    /// Absent for free-form lines that do not map to a catalog product.
    pub product_id: Option<Uuid>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// Request to create a supplier order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSupplierOrderRequest {
    pub order_number: Option<String>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<CreateSupplierOrderItem>,
    /// Defaults to the current time when absent.
    pub order_date: Option<DateTime<Utc>>,
    pub expected_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Supplier order line enriched with the product name for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierOrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// Full supplier order representation returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierOrderResponse {
    pub id: Uuid,
    pub order_number: Option<String>,
    pub status: SupplierOrderStatus,
    pub order_date: DateTime<Utc>,
    pub expected_date: Option<DateTime<Utc>>,
    pub received_date: Option<DateTime<Utc>>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub items: Vec<SupplierOrderItemResponse>,
    pub created_at: DateTime<Utc>,
}

impl SupplierOrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a supplier order. The total is computed from the lines.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_supplier_order(
        &self,
        user_id: Uuid,
        request: CreateSupplierOrderRequest,
    ) -> Result<SupplierOrderResponse, ServiceError> {
        request.validate()?;

        for item in &request.items {
            item.validate()?;
            if item.unit_cost.is_sign_negative() {
                return Err(ServiceError::InvalidInput(
                    "Unit cost cannot be negative".to_string(),
                ));
            }
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        // Lines that reference a product must reference the user's own.
        let mut product_names: HashMap<Uuid, String> = HashMap::new();
        for item in &request.items {
            if let Some(product_id) = item.product_id {
                let product = product::Entity::find_by_id(product_id)
                    .filter(product::Column::UserId.eq(user_id))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
                product_names.insert(product.id, product.name);
            }
        }

        let total_amount: Decimal = request
            .items
            .iter()
            .map(|item| item.unit_cost * Decimal::from(item.quantity))
            .sum();

        let now = Utc::now();
        let order = supplier_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            order_number: Set(request.order_number),
            status: Set(SupplierOrderStatus::Pending),
            order_date: Set(request.order_date.unwrap_or(now)),
            expected_date: Set(request.expected_date),
            received_date: Set(None),
            total_amount: Set(total_amount),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut item_responses = Vec::with_capacity(request.items.len());
        for item in request.items {
            let inserted = supplier_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                supplier_order_id: Set(order.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_cost: Set(item.unit_cost),
            }
            .insert(&txn)
            .await?;

            item_responses.push(SupplierOrderItemResponse {
                id: inserted.id,
                product_id: inserted.product_id,
                product_name: inserted
                    .product_id
                    .and_then(|id| product_names.get(&id).cloned()),
                quantity: inserted.quantity,
                unit_cost: inserted.unit_cost,
            });
        }

        txn.commit().await.map_err(|e| {
            error!("Failed to commit supplier order transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(supplier_order_id = %order.id, total = %order.total_amount, "Supplier order created");

        Ok(Self::to_response(order, item_responses))
    }

    /// Lists the user's supplier orders, newest order date first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_supplier_orders(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supplier_order::Model>, u64), ServiceError> {
        let paginator = supplier_order::Entity::find()
            .filter(supplier_order::Column::UserId.eq(user_id))
            .order_by_desc(supplier_order::Column::OrderDate)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders, total))
    }

    /// Fetches one supplier order with its lines.
    #[instrument(skip(self), fields(user_id = %user_id, supplier_order_id = %supplier_order_id))]
    pub async fn get_supplier_order(
        &self,
        user_id: Uuid,
        supplier_order_id: Uuid,
    ) -> Result<SupplierOrderResponse, ServiceError> {
        let order = self.find_owned(user_id, supplier_order_id).await?;

        let items = supplier_order_item::Entity::find()
            .filter(supplier_order_item::Column::SupplierOrderId.eq(order.id))
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().filter_map(|i| i.product_id).collect();
        let product_names: HashMap<Uuid, String> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let item_responses = items
            .into_iter()
            .map(|item| SupplierOrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: item
                    .product_id
                    .and_then(|id| product_names.get(&id).cloned()),
                quantity: item.quantity,
                unit_cost: item.unit_cost,
            })
            .collect();

        Ok(Self::to_response(order, item_responses))
    }

    /// Marks a supplier order as received and credits stock for every
    /// line that references a catalog product. Receiving twice is
    /// rejected so stock is never double counted.
    #[instrument(skip(self), fields(user_id = %user_id, supplier_order_id = %supplier_order_id))]
    pub async fn receive_supplier_order(
        &self,
        user_id: Uuid,
        supplier_order_id: Uuid,
    ) -> Result<SupplierOrderResponse, ServiceError> {
        let order = self.find_owned(user_id, supplier_order_id).await?;

        if order.status == SupplierOrderStatus::Completed {
            return Err(ServiceError::Conflict(
                "Order already received".to_string(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let items = supplier_order_item::Entity::find()
            .filter(supplier_order_item::Column::SupplierOrderId.eq(order.id))
            .all(&txn)
            .await?;

        for item in &items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            let product = product::Entity::find_by_id(product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

            let new_stock = product.stock_quantity + item.quantity;
            let mut stock_update: product::ActiveModel = product.into();
            stock_update.stock_quantity = Set(new_stock);
            stock_update.updated_at = Set(Some(Utc::now()));
            stock_update.update(&txn).await?;
        }

        let now = Utc::now();
        let mut model: supplier_order::ActiveModel = order.into();
        model.status = Set(SupplierOrderStatus::Completed);
        model.received_date = Set(Some(now));
        model.updated_at = Set(Some(now));
        let updated = model.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit receive transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(supplier_order_id = %updated.id, "Supplier order received");

        self.get_supplier_order(user_id, updated.id).await
    }

    #[instrument(skip(self), fields(user_id = %user_id, supplier_order_id = %supplier_order_id))]
    pub async fn delete_supplier_order(
        &self,
        user_id: Uuid,
        supplier_order_id: Uuid,
    ) -> Result<(), ServiceError> {
        let order = self.find_owned(user_id, supplier_order_id).await?;
        order.delete(&*self.db).await?;
        Ok(())
    }

    async fn find_owned(
        &self,
        user_id: Uuid,
        supplier_order_id: Uuid,
    ) -> Result<supplier_order::Model, ServiceError> {
        supplier_order::Entity::find_by_id(supplier_order_id)
            .filter(supplier_order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supplier order not found".to_string()))
    }

    fn to_response(
        order: supplier_order::Model,
        items: Vec<SupplierOrderItemResponse>,
    ) -> SupplierOrderResponse {
        SupplierOrderResponse {
            id: order.id,
            order_number: order.order_number,
            status: order.status,
            order_date: order.order_date,
            expected_date: order.expected_date,
            received_date: order.received_date,
            total_amount: order.total_amount,
            notes: order.notes,
            items,
            created_at: order.created_at,
        }
    }
}
