//! Quarry
//!
//! Pricing, minimum-order and fulfillment rules for bulk-materials orders.
//! Everything in this crate is pure; persistence lives in `quarry-app`.

pub mod availability;
pub mod cart;
pub mod discounts;
pub mod fulfillment;
pub mod minimum_order;
pub mod money;
pub mod policy;
pub mod pricing;
pub mod products;
pub mod uuids;
pub mod weights;
