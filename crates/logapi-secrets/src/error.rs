use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("secret not found: {name}")]
    NotFound { name: String },

    #[error("secret {name} has no value")]
    Empty { name: String },

    #[error("Secrets Manager GetSecretValue error: {0}")]
    GetSecretValue(String),

    #[error("secret {name} is not valid credentials JSON: {source}")]
    InvalidCredentials {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
