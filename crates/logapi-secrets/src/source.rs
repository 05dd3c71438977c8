use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;

use crate::error::SecretsError;

/// Somewhere named secrets can be read from.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// The secret's value as text.
    async fn secret_string(&self, name: &str) -> Result<String, SecretsError>;
}

/// AWS Secrets Manager.
#[derive(Clone)]
pub struct SecretsManagerSource {
    client: Client,
}

impl SecretsManagerSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretSource for SecretsManagerSource {
    async fn secret_string(&self, name: &str) -> Result<String, SecretsError> {
        let resp = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_resource_not_found_exception() {
                    SecretsError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    SecretsError::GetSecretValue(err.to_string())
                }
            })?;

        if let Some(text) = resp.secret_string() {
            return Ok(text.to_string());
        }

        // Binary secrets hold the same JSON document as bytes.
        let binary = resp.secret_binary().ok_or_else(|| SecretsError::Empty {
            name: name.to_string(),
        })?;
        Ok(String::from_utf8_lossy(binary.as_ref()).into_owned())
    }
}
