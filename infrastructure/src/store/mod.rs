//! Record store adapters.

mod memory;

pub use memory::InMemoryRecordStore;

/// Owner of rows in entities that are not tenant scoped.
pub const SHARED_TENANT: &str = "_shared";
