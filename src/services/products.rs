use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::product;
use crate::errors::ServiceError;

/// Service for the product catalog, including stock levels.
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

/// Request to create a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_range")]
    pub range: String,
    pub equivalence: Option<String>,
    pub cost_price: Decimal,
    pub sell_price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "Initial stock cannot be negative"))]
    pub stock_quantity: i32,
    #[serde(default)]
    pub allow_negative_stock: bool,
    pub size: Option<String>,
    pub notes: Option<String>,
}

fn default_category() -> String {
    "Geral".to_string()
}

fn default_range() -> String {
    "Standard".to_string()
}

/// Request to update a product; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Code cannot be empty"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub range: Option<String>,
    pub equivalence: Option<String>,
    pub cost_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub allow_negative_stock: Option<bool>,
    pub size: Option<String>,
    pub notes: Option<String>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %user_id, code = %request.code))]
    pub async fn create_product(
        &self,
        user_id: Uuid,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        if request.cost_price.is_sign_negative() || request.sell_price.is_sign_negative() {
            return Err(ServiceError::InvalidInput(
                "Prices cannot be negative".to_string(),
            ));
        }

        let duplicate = product::Entity::find()
            .filter(product::Column::UserId.eq(user_id))
            .filter(product::Column::Code.eq(request.code.as_str()))
            .one(&*self.db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A product with code '{}' already exists",
                request.code
            )));
        }

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            code: Set(request.code),
            name: Set(request.name),
            category: Set(request.category),
            range: Set(request.range),
            equivalence: Set(request.equivalence),
            cost_price: Set(request.cost_price),
            sell_price: Set(request.sell_price),
            stock_quantity: Set(request.stock_quantity),
            allow_negative_stock: Set(request.allow_negative_stock),
            size: Set(request.size),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        Ok(model)
    }

    /// Lists the user's products ordered by name, with the total count.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_products(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = product::Entity::find()
            .filter(product::Column::UserId.eq(user_id))
            .order_by_asc(product::Column::Name)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((products, total))
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn get_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .filter(product::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    #[instrument(skip(self, request), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn update_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let existing = self.get_product(user_id, product_id).await?;

        if let Some(code) = &request.code {
            if *code != existing.code {
                let duplicate = product::Entity::find()
                    .filter(product::Column::UserId.eq(user_id))
                    .filter(product::Column::Code.eq(code.as_str()))
                    .one(&*self.db)
                    .await?;
                if duplicate.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "A product with code '{}' already exists",
                        code
                    )));
                }
            }
        }

        let mut model: product::ActiveModel = existing.into();
        if let Some(code) = request.code {
            model.code = Set(code);
        }
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(category) = request.category {
            model.category = Set(category);
        }
        if let Some(range) = request.range {
            model.range = Set(range);
        }
        if let Some(equivalence) = request.equivalence {
            model.equivalence = Set(Some(equivalence));
        }
        if let Some(cost_price) = request.cost_price {
            if cost_price.is_sign_negative() {
                return Err(ServiceError::InvalidInput(
                    "Prices cannot be negative".to_string(),
                ));
            }
            model.cost_price = Set(cost_price);
        }
        if let Some(sell_price) = request.sell_price {
            if sell_price.is_sign_negative() {
                return Err(ServiceError::InvalidInput(
                    "Prices cannot be negative".to_string(),
                ));
            }
            model.sell_price = Set(sell_price);
        }
        if let Some(stock_quantity) = request.stock_quantity {
            model.stock_quantity = Set(stock_quantity);
        }
        if let Some(allow_negative_stock) = request.allow_negative_stock {
            model.allow_negative_stock = Set(allow_negative_stock);
        }
        if let Some(size) = request.size {
            model.size = Set(Some(size));
        }
        if let Some(notes) = request.notes {
            model.notes = Set(Some(notes));
        }
        model.updated_at = Set(Some(Utc::now()));

        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn delete_product(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.get_product(user_id, product_id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }

    /// Removes the user's entire catalog and reports how many rows went.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_all_products(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = product::Entity::delete_many()
            .filter(product::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        info!(
            deleted = result.rows_affected,
            "Deleted entire product catalog"
        );
        Ok(result.rows_affected)
    }
}
