//! Progress reporting for requests and deliberations

pub mod reporter;
