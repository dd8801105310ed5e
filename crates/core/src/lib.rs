//! Core business logic for vigia-rs.
//!
//! Role-scoped live views over the document store, mutation policy
//! checks, and the pure aggregations dashboards are built from.

pub mod services;

pub use services::*;
