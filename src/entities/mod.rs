pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod supplier_order;
pub mod supplier_order_item;
pub mod user;
