//! Plans, steps and the rules that drive them.
//!
//! - [`analysis`]: ANALYZE phase classification
//! - [`parser`]: model output → [`Plan`](entities::Plan)
//! - [`resolver`]: step references → concrete values
//! - [`state`]: cognitive phases and legal transitions
//! - [`format`]: FORMAT phase rendering

pub mod analysis;
pub mod entities;
pub mod format;
pub mod parser;
pub mod resolver;
pub mod state;
pub mod value_objects;
