use std::task::{Context, Poll};

use logapi_core::envelope::Envelope;
use tower::{Layer, Service};

use crate::BoxFuture;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";

/// Adds CORS response headers to every envelope a handler returns.
#[derive(Debug, Clone)]
pub struct CorsHeadersLayer {
    origin: String,
    credentials: bool,
}

impl Default for CorsHeadersLayer {
    fn default() -> Self {
        Self::new("*")
    }
}

impl CorsHeadersLayer {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            credentials: false,
        }
    }

    pub fn allow_credentials(mut self, credentials: bool) -> Self {
        self.credentials = credentials;
        self
    }

    fn apply(&self, envelope: Envelope) -> Envelope {
        let envelope = envelope.with_header(ALLOW_ORIGIN, self.origin.as_str());
        if self.credentials {
            envelope.with_header(ALLOW_CREDENTIALS, "true")
        } else {
            envelope
        }
    }
}

impl<S> Layer<S> for CorsHeadersLayer {
    type Service = CorsHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsHeaders {
            inner,
            config: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsHeaders<S> {
    inner: S,
    config: CorsHeadersLayer,
}

impl<S, R> Service<R> for CorsHeaders<S>
where
    S: Service<R, Response = Envelope>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Envelope;
    type Error = S::Error;
    type Future = BoxFuture<Result<Envelope, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: R) -> Self::Future {
        let response = self.inner.call(request);
        let config = self.config.clone();
        Box::pin(async move { Ok(config.apply(response.await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;
    use tower::{ServiceExt, service_fn};

    async fn ok(_: ()) -> Result<Envelope, Infallible> {
        Ok(Envelope::success(json!([])))
    }

    #[tokio::test]
    async fn wildcard_origin_by_default() {
        let envelope = CorsHeadersLayer::default()
            .layer(service_fn(ok))
            .oneshot(())
            .await
            .unwrap();
        assert_eq!(envelope.headers.get(ALLOW_ORIGIN).map(String::as_str), Some("*"));
        assert!(!envelope.headers.contains_key(ALLOW_CREDENTIALS));
        assert_eq!(
            envelope.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn explicit_origin_with_credentials() {
        let envelope = CorsHeadersLayer::new("https://app.example.com")
            .allow_credentials(true)
            .layer(service_fn(ok))
            .oneshot(())
            .await
            .unwrap();
        assert_eq!(
            envelope.headers.get(ALLOW_ORIGIN).map(String::as_str),
            Some("https://app.example.com")
        );
        assert_eq!(
            envelope.headers.get(ALLOW_CREDENTIALS).map(String::as_str),
            Some("true")
        );
    }
}
