//! Output rendering: colored console text and JSON.

pub mod console;
pub mod json;
