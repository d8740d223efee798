use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::entities::customer;
use crate::errors::ServiceError;

/// Service for customer records. Every operation is scoped to the owning
/// user; rows belonging to other users behave as if they do not exist.
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

/// Request to create a customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Phone is required"))]
    pub phone: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Request to update a customer; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Phone cannot be empty"))]
    pub phone: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create_customer(
        &self,
        user_id: Uuid,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;

        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(request.name),
            phone: Set(request.phone),
            email: Set(request.email),
            address: Set(request.address),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        Ok(model)
    }

    /// Lists the user's customers ordered by name, with the total count.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_customers(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let paginator = customer::Entity::find()
            .filter(customer::Column::UserId.eq(user_id))
            .order_by_asc(customer::Column::Name)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((customers, total))
    }

    #[instrument(skip(self), fields(user_id = %user_id, customer_id = %customer_id))]
    pub async fn get_customer(
        &self,
        user_id: Uuid,
        customer_id: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .filter(customer::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }

    #[instrument(skip(self, request), fields(user_id = %user_id, customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        user_id: Uuid,
        customer_id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;

        let existing = self.get_customer(user_id, customer_id).await?;

        let mut model: customer::ActiveModel = existing.into();
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(phone) = request.phone {
            model.phone = Set(phone);
        }
        if let Some(email) = request.email {
            model.email = Set(Some(email));
        }
        if let Some(address) = request.address {
            model.address = Set(Some(address));
        }
        if let Some(notes) = request.notes {
            model.notes = Set(Some(notes));
        }
        model.updated_at = Set(Some(Utc::now()));

        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self), fields(user_id = %user_id, customer_id = %customer_id))]
    pub async fn delete_customer(
        &self,
        user_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.get_customer(user_id, customer_id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_name_and_phone() {
        let request = CreateCustomerRequest {
            name: "".to_string(),
            phone: "912345678".to_string(),
            email: None,
            address: None,
            notes: None,
        };
        assert!(request.validate().is_err());

        let request = CreateCustomerRequest {
            name: "Maria Silva".to_string(),
            phone: "".to_string(),
            email: None,
            address: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn update_request_allows_partial_payloads() {
        let request = UpdateCustomerRequest {
            notes: Some("Prefers morning deliveries".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }
}
