//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`] - strongly typed identifiers (tenant, session, request, plan, case)
//! - [`request::Request`] - an inbound message, immutable once created
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod ids;
pub mod request;
pub mod string;
