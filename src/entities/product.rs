use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Code is required"))]
    pub code: String,

    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    pub category: String,
    pub range: String,
    pub equivalence: Option<String>,

    pub cost_price: Decimal,
    pub sell_price: Decimal,

    pub stock_quantity: i32,
    pub allow_negative_stock: bool,

    pub size: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::supplier_order_item::Entity")]
    SupplierOrderItems,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::supplier_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierOrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
