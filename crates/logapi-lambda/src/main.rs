use std::sync::Arc;

use lambda_http::lambda_runtime::{self, LambdaEvent};
use lambda_http::service_fn;
use logapi_core::models::event::InvocationEvent;
use logapi_middleware::{AuditLayer, CorsHeadersLayer};
use logapi_secrets::resolver::ConnectionResolver;
use logapi_secrets::source::SecretsManagerSource;
use logapi_store::SessionFactory;
use logapi_store::schema::ensure_schema;
use tower::ServiceBuilder;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;

    let sessions = match &config.database_url {
        Some(url) => {
            tracing::info!("using fixed database url");
            SessionFactory::from_url(url.clone(), config.pool_settings())
        }
        None => {
            let client = logapi_secrets::client::build_client().await;
            let resolver =
                ConnectionResolver::new(Arc::new(SecretsManagerSource::new(client)), &config.stage);
            SessionFactory::new(resolver, config.pool_settings())
        }
    };
    let sessions = Arc::new(sessions);

    if config.bootstrap_schema {
        ensure_schema(&sessions).await?;
    }

    let state = AppState {
        sessions: sessions.clone(),
    };
    let audit = config.audit_self.then(|| AuditLayer::new(sessions.clone()));

    let handler = ServiceBuilder::new()
        .layer(
            CorsHeadersLayer::new(config.cors_origin.as_str())
                .allow_credentials(config.cors_credentials),
        )
        .option_layer(audit)
        .service(service_fn(move |event: LambdaEvent<InvocationEvent>| {
            routes::logs::query_logs(state.clone(), event)
        }));

    tracing::info!(
        stage = %config.stage,
        audit_self = config.audit_self,
        "log query function ready"
    );
    lambda_runtime::run(handler).await.map_err(|e| eyre::eyre!(e))
}
