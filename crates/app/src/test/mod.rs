//! Test support.


pub(crate) use context::TestContext;
pub(crate) use doubles::*;
pub(crate) use memory::{MemoryOrdersStore, RowCounts};
