use std::sync::Arc;

use logapi_store::SessionFactory;

/// Shared state handed to every invocation.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionFactory>,
}
