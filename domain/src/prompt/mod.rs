//! Prompt domain
//!
//! Templates for the model calls made by the planner and by each
//! deliberation specialist. Wording is not load-bearing; the response
//! formats they request are, because [`crate::plan::parser`] and
//! [`crate::deliberation::parsing`] read them back.

pub mod deliberation;
pub mod planning;

pub use deliberation::DeliberationPromptTemplate;
pub use planning::PlanningPromptTemplate;
