//! Quarry Domain Concerns

pub mod orders;
