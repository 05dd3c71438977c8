//! logapi-secrets
//!
//! Database credential resolution from AWS Secrets Manager.

pub mod client;
pub mod credentials;
pub mod error;
pub mod resolver;
pub mod source;
