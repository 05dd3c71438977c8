use logapi_core::error::CoreError;
use logapi_secrets::error::SecretsError;
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("integrity violation during {operation}: {message}")]
    IntegrityViolation {
        operation: &'static str,
        message: String,
    },

    #[error("database error during {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("audit record {id} does not exist")]
    MissingRecord { id: i64 },

    #[error("audit record {id} already has a response")]
    AlreadyComplete { id: i64 },

    #[error("database did not report the id of the inserted audit record")]
    MissingInsertId,

    #[error("credential resolution failed: {0}")]
    Secrets(#[from] SecretsError),
}

impl StoreError {
    /// Bad input from the caller rather than a storage failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The connection itself is suspect and should not go back to the pool.
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            Self::Persistence {
                source: sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::WorkerCrashed,
                ..
            }
        )
    }
}

/// Attach the failing operation to a sqlx error, classifying constraint
/// failures as integrity violations.
pub trait PersistenceContext<T> {
    fn during(self, operation: &'static str) -> Result<T, StoreError>;
}

impl<T> PersistenceContext<T> for Result<T, sqlx::Error> {
    fn during(self, operation: &'static str) -> Result<T, StoreError> {
        self.map_err(|source| {
            if let Some(db) = source.as_database_error() {
                match db.kind() {
                    ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => {
                        return StoreError::IntegrityViolation {
                            operation,
                            message: db.message().to_string(),
                        };
                    }
                    _ => {}
                }
            }
            StoreError::Persistence { operation, source }
        })
    }
}
