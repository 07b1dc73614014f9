//! Quarry application layer: order intake, persistence, notifications and
//! fulfillment tracking on top of the pure `quarry` core.

pub mod catalog;
pub mod config;
pub mod database;
pub mod domain;
pub mod notifications;
pub mod observability;

#[cfg(test)]
mod test;
