//! Orders

pub mod data;
pub mod errors;
pub mod records;
mod repositories;
pub mod service;
pub mod store;
pub mod transitions;

pub use errors::{OrdersServiceError, OrdersStoreError, WriteStep};
pub use service::*;
pub use store::*;
