//! logapi-middleware
//!
//! Tower layers that decorate function handlers of the shape
//! `LambdaEvent<InvocationEvent> -> Envelope`.

use std::future::Future;
use std::pin::Pin;

pub mod audit;
pub mod cors;
pub mod json_body;

pub use audit::AuditLayer;
pub use cors::CorsHeadersLayer;
pub use json_body::JsonBodyLayer;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
