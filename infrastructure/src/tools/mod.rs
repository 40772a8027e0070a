//! Tool providers and the registry that routes calls to them
//!
//! ## Providers
//!
//! - `entity`: CRUD and vector search generated from the data schema
//! - `knowledge`: `knowledge_search` over the knowledge base
//! - `memory`: `remember` / `recall_memory`
//! - `deliberation`: `start_deliberation`, handing off to the specialists

pub mod deliberation;
pub mod entity;
pub mod knowledge;
pub mod memory;

mod registry;

pub use deliberation::DeliberationToolProvider;
pub use entity::EntityToolProvider;
pub use knowledge::KnowledgeToolProvider;
pub use memory::{MEMORY_ENTITY, MemoryToolProvider};
pub use registry::{RegistryStats, ToolRegistry};
