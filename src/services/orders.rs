use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::order::{self, OrderStatus};
use crate::entities::{customer, order_item, product};
use crate::errors::ServiceError;

/// Service for sales orders.
///
/// Order placement is transactional: the order row, its items, and the
/// stock decrements all land together or not at all. Unit prices, costs
/// and the profit figure are snapshotted at placement so later catalog
/// edits never rewrite history.
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

/// A single line of a new order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Charged price per unit. Defaults to the catalog sell price; the
    /// order form sends it explicitly when the seller discounts a line.
    pub unit_price: Option<Decimal>,
}

/// Request to place an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    #[validate]
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<CreateOrderItem>,
    /// Defaults to the current time when absent.
    pub order_date: Option<DateTime<Utc>>,
}

/// Request to change one order's status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Request to change the status of several orders at once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: OrderStatus,
}

/// Order line enriched with the product name for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Full order representation returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub total_profit: Decimal,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Places an order for the given user.
    ///
    /// Stock is checked per product against the summed quantity across
    /// all of its lines: a product whose stock would go negative rejects
    /// the whole order unless the product opts into negative stock. On
    /// success each product's stock is decremented by that sum.
    #[instrument(skip(self, request), fields(user_id = %user_id, customer_id = %request.customer_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
            if let Some(price) = item.unit_price {
                if price.is_sign_negative() {
                    return Err(ServiceError::InvalidInput(
                        "Unit price cannot be negative".to_string(),
                    ));
                }
            }
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .filter(customer::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))?;

        // A product repeated across several lines must be checked and
        // decremented once, against the summed quantity.
        let mut requested: HashMap<Uuid, i32> = HashMap::new();
        for item in &request.items {
            *requested.entry(item.product_id).or_insert(0) += item.quantity;
        }

        let mut products: HashMap<Uuid, product::Model> = HashMap::new();
        for (&product_id, &quantity) in &requested {
            let product = product::Entity::find_by_id(product_id)
                .filter(product::Column::UserId.eq(user_id))
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

            if product.stock_quantity < quantity && !product.allow_negative_stock {
                return Err(ServiceError::InsufficientStock(format!(
                    "{}. Available: {}",
                    product.name, product.stock_quantity
                )));
            }
            products.insert(product_id, product);
        }

        let mut total_amount = Decimal::ZERO;
        let mut total_cost = Decimal::ZERO;
        let mut lines: Vec<(Uuid, i32, Decimal, Decimal)> =
            Vec::with_capacity(request.items.len());

        for item in &request.items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

            let unit_price = item.unit_price.unwrap_or(product.sell_price);
            let quantity = Decimal::from(item.quantity);
            let subtotal = unit_price * quantity;
            let line_cost = product.cost_price * quantity;

            total_amount += subtotal;
            total_cost += line_cost;
            lines.push((item.product_id, item.quantity, unit_price, subtotal));
        }

        let now = Utc::now();
        let order_date = request.order_date.unwrap_or(now);

        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            customer_id: Set(customer.id),
            status: Set(OrderStatus::Pending),
            order_date: Set(order_date),
            total_amount: Set(total_amount),
            total_profit: Set(total_amount - total_cost),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut item_responses = Vec::with_capacity(lines.len());
        for (product_id, quantity, unit_price, subtotal) in lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                unit_price: Set(unit_price),
                subtotal: Set(subtotal),
            }
            .insert(&txn)
            .await?;

            item_responses.push(OrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: products.get(&product_id).map(|p| p.name.clone()),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            });
        }

        for (&product_id, &quantity) in &requested {
            product::Entity::update_many()
                .col_expr(
                    product::Column::StockQuantity,
                    Expr::col(product::Column::StockQuantity).sub(quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(Some(now)))
                .filter(product::Column::Id.eq(product_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await.map_err(|e| {
            error!("Failed to commit order transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order.id, total = %order.total_amount, "Order placed");

        Ok(OrderResponse {
            id: order.id,
            customer_id: order.customer_id,
            customer_name: Some(customer.name),
            status: order.status,
            order_date: order.order_date,
            total_amount: order.total_amount,
            total_profit: order.total_profit,
            items: item_responses,
            created_at: order.created_at,
        })
    }

    /// Lists the user's orders, newest first, with the total count.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_orders(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let paginator = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::OrderDate)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders, total))
    }

    /// Fetches one order with its customer and item lines.
    #[instrument(skip(self), fields(user_id = %user_id, order_id = %order_id))]
    pub async fn get_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let customer = customer::Entity::find_by_id(order.customer_id)
            .one(&*self.db)
            .await?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let product_names: HashMap<Uuid, String> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let item_responses = items
            .into_iter()
            .map(|item| OrderItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: product_names.get(&item.product_id).cloned(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            })
            .collect();

        Ok(OrderResponse {
            id: order.id,
            customer_id: order.customer_id,
            customer_name: customer.map(|c| c.name),
            status: order.status,
            order_date: order.order_date,
            total_amount: order.total_amount,
            total_profit: order.total_profit,
            items: item_responses,
            created_at: order.created_at,
        })
    }

    #[instrument(skip(self), fields(user_id = %user_id, order_id = %order_id))]
    pub async fn update_order_status(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let mut model: order::ActiveModel = existing.into();
        model.status = Set(status);
        model.updated_at = Set(Some(Utc::now()));

        Ok(model.update(&*self.db).await?)
    }

    /// Updates the status of several orders at once, returning how many
    /// rows actually changed. Orders owned by other users are ignored.
    #[instrument(skip(self, ids), fields(user_id = %user_id, count = ids.len()))]
    pub async fn bulk_update_status(
        &self,
        user_id: Uuid,
        ids: Vec<Uuid>,
        status: OrderStatus,
    ) -> Result<u64, ServiceError> {
        if ids.is_empty() {
            return Err(ServiceError::InvalidInput(
                "No orders selected".to_string(),
            ));
        }

        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(status))
            .col_expr(order::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::Id.is_in(ids))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
