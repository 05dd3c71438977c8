use std::task::{Context, Poll};

use lambda_http::lambda_runtime::LambdaEvent;
use logapi_core::envelope::Envelope;
use logapi_core::models::event::InvocationEvent;
use serde_json::{Map, Value};
use tower::{Layer, Service};
use tracing::debug;

use crate::BoxFuture;

/// Parses a string request body as JSON before the handler sees it.
///
/// Any non-string body is replaced with `{}`. A body that is not valid JSON
/// is answered with a bad-request envelope and the handler is not called.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyLayer;

impl<S> Layer<S> for JsonBodyLayer {
    type Service = JsonBody<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JsonBody { inner }
    }
}

#[derive(Debug, Clone)]
pub struct JsonBody<S> {
    inner: S,
}

impl<S> Service<LambdaEvent<InvocationEvent>> for JsonBody<S>
where
    S: Service<LambdaEvent<InvocationEvent>, Response = Envelope>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Envelope;
    type Error = S::Error;
    type Future = BoxFuture<Result<Envelope, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut event: LambdaEvent<InvocationEvent>) -> Self::Future {
        let body = match event.payload.body.take() {
            Some(Value::String(text)) => match serde_json::from_str(&text) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(error = %e, "request body is not valid JSON");
                    return Box::pin(async { Ok(Envelope::bad_request("Invalid JSON body")) });
                }
            },
            _ => Value::Object(Map::new()),
        };
        event.payload.body = Some(body);
        event.payload.is_base64_encoded = false;

        Box::pin(self.inner.call(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::lambda_runtime::Context as InvocationContext;
    use serde_json::json;
    use std::convert::Infallible;
    use tower::{ServiceExt, service_fn};

    async fn echo(event: LambdaEvent<InvocationEvent>) -> Result<Envelope, Infallible> {
        Ok(Envelope::success(event.payload.body.unwrap_or(Value::Null)))
    }

    async fn call(body: Value) -> Envelope {
        let payload: InvocationEvent = serde_json::from_value(json!({ "body": body })).unwrap();
        JsonBodyLayer
            .layer(service_fn(echo))
            .oneshot(LambdaEvent::new(payload, InvocationContext::default()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn string_body_is_parsed() {
        let envelope = call(json!("{\"a\":1}")).await;
        assert_eq!(envelope.body_json().unwrap()["data"], json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn missing_body_becomes_empty_object() {
        let envelope = call(Value::Null).await;
        assert_eq!(envelope.body_json().unwrap()["data"], json!({}));
    }

    #[tokio::test]
    async fn invalid_json_short_circuits() {
        let envelope = call(json!("{not json")).await;
        assert_eq!(envelope.status_code, 400);
        assert!(envelope.is_error());
        assert_eq!(envelope.body_json().unwrap()["message"], "Invalid JSON body");
    }
}
