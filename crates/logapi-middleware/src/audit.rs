//! Audit logging layer.
//!
//! Records the inbound event as a pending audit row before the handler
//! runs, then completes that row with the envelope the handler produced.

use std::sync::Arc;
use std::task::{Context, Poll};

use lambda_http::Error;
use lambda_http::lambda_runtime::LambdaEvent;
use logapi_core::envelope::Envelope;
use logapi_core::models::event::InvocationEvent;
use logapi_core::models::outcome::ResponseOutcome;
use logapi_store::{SessionFactory, complete_response, record_request};
use tower::{Layer, Service};
use tracing::warn;

use crate::BoxFuture;

#[derive(Clone)]
pub struct AuditLayer {
    factory: Arc<SessionFactory>,
    fail_open: bool,
}

impl AuditLayer {
    pub fn new(factory: Arc<SessionFactory>) -> Self {
        Self {
            factory,
            fail_open: false,
        }
    }

    /// Log recording failures and keep serving instead of failing the
    /// invocation.
    pub fn fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditService {
            inner,
            factory: self.factory.clone(),
            fail_open: self.fail_open,
        }
    }
}

#[derive(Clone)]
pub struct AuditService<S> {
    inner: S,
    factory: Arc<SessionFactory>,
    fail_open: bool,
}

impl<S> Service<LambdaEvent<InvocationEvent>> for AuditService<S>
where
    S: Service<LambdaEvent<InvocationEvent>, Response = Envelope, Error = Error>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = Envelope;
    type Error = Error;
    type Future = BoxFuture<Result<Envelope, Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, event: LambdaEvent<InvocationEvent>) -> Self::Future {
        // Keep the instance that was polled ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let factory = self.factory.clone();
        let fail_open = self.fail_open;

        Box::pin(async move {
            let invocation_context = format!("{:?}", event.context);
            let record = match record_request(&factory, &event.payload, &invocation_context).await {
                Ok(record) => Some(record),
                Err(e) if fail_open => {
                    warn!(error = %e, "request not recorded, continuing without audit");
                    None
                }
                Err(e) => return Err(e.into()),
            };

            let envelope = inner.call(event).await?;

            if let Some(record) = record {
                let outcome = ResponseOutcome::from(&envelope);
                if let Err(e) = complete_response(&factory, &record, Some(&outcome)).await {
                    if !fail_open {
                        return Err(e.into());
                    }
                    warn!(id = record.id, error = %e, "response not recorded");
                }
            }

            Ok(envelope)
        })
    }
}
