use std::sync::Arc;

use tracing::debug;

use crate::credentials::{ConnectionCredentials, DbMode, secret_name};
use crate::error::SecretsError;
use crate::source::SecretSource;

/// Resolves the credentials for a database mode under a deployment stage.
#[derive(Clone)]
pub struct ConnectionResolver {
    source: Arc<dyn SecretSource>,
    stage: String,
}

impl ConnectionResolver {
    pub fn new(source: Arc<dyn SecretSource>, stage: impl Into<String>) -> Self {
        Self {
            source,
            stage: stage.into(),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub async fn resolve(&self, mode: DbMode) -> Result<ConnectionCredentials, SecretsError> {
        let name = secret_name(&self.stage, mode);
        let text = self.source.secret_string(&name).await?;
        let credentials: ConnectionCredentials = serde_json::from_str(&text)
            .map_err(|source| SecretsError::InvalidCredentials {
                name: name.clone(),
                source,
            })?;

        debug!(secret = %name, host = %credentials.host, "resolved database credentials");
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct FakeSource {
        secrets: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SecretSource for FakeSource {
        async fn secret_string(&self, name: &str) -> Result<String, SecretsError> {
            self.requested.lock().unwrap().push(name.to_string());
            self.secrets
                .get(name)
                .cloned()
                .ok_or_else(|| SecretsError::NotFound {
                    name: name.to_string(),
                })
        }
    }

    fn source_with(name: &str, value: &str) -> Arc<FakeSource> {
        let mut secrets = HashMap::new();
        secrets.insert(name.to_string(), value.to_string());
        Arc::new(FakeSource {
            secrets,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn resolves_mode_secret_for_stage() {
        let source = source_with(
            "qa/dbw-fcc",
            r#"{"username":"w","password":"pw","host":"db","bd_name":"logs"}"#,
        );
        let resolver = ConnectionResolver::new(source.clone(), "qa");

        let creds = resolver.resolve(DbMode::Write).await.unwrap();
        assert_eq!(creds.username, "w");
        assert_eq!(
            source.requested.lock().unwrap().as_slice(),
            ["qa/dbw-fcc".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_secret_is_reported_by_name() {
        let resolver = ConnectionResolver::new(Arc::new(FakeSource::default()), "qa");
        let err = resolver.resolve(DbMode::Read).await.unwrap_err();
        assert!(matches!(err, SecretsError::NotFound { ref name } if name == "qa/dbr-fcc"));
    }

    #[tokio::test]
    async fn malformed_secret_is_rejected() {
        let resolver = ConnectionResolver::new(source_with("qa/dbr-fcc", "not json"), "qa");
        assert!(matches!(
            resolver.resolve(DbMode::Read).await,
            Err(SecretsError::InvalidCredentials { .. })
        ));
    }
}
