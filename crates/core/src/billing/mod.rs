//! Dynamic pricing and billing.
//!
//! Pure decision logic over a product's cost/MRP/minimum price and a
//! proposed selling price. Order snapshots are priced once at sale time;
//! bills and profit reports are projections and reductions over the stored
//! snapshots, never re-derived from current product state.

pub mod bills;
pub mod pricing;
pub mod reports;

pub use bills::{admin_bill, customer_bill, AdminBill, BillView, CustomerBill};
pub use pricing::{price_sale, PricingSnapshot, SaleRejection};
pub use reports::{daily_profit, profit_by_product, shop_profit_summary};
