//! logapi-store
//!
//! Persistence for the API audit log: mode-scoped database sessions, the
//! request recorder, the response completor and the filter query service.

pub mod completor;
pub mod entity;
pub mod error;
pub mod query;
pub mod recorder;
pub mod schema;
pub mod session;

pub use completor::complete_response;
pub use entity::AuditRecord;
pub use error::StoreError;
pub use query::{Lookup, filter_records};
pub use recorder::record_request;
pub use session::{PoolSettings, Session, SessionFactory};
