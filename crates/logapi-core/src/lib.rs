//! logapi-core
//!
//! Pure domain types for the API audit log: the invocation event shape,
//! the audit column set, filter validation, read-side rendering and the
//! response envelope. No AWS SDK or database dependency.

pub mod column;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod models;
pub mod render;
