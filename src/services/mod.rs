pub mod customers;
pub mod imports;
pub mod orders;
pub mod products;
pub mod reports;
pub mod supplier_orders;

pub use customers::CustomerService;
pub use imports::ImportService;
pub use orders::OrderService;
pub use products::ProductService;
pub use reports::ReportService;
pub use supplier_orders::SupplierOrderService;
