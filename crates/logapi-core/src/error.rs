use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no filter parameters were supplied")]
    MissingFilter,

    #[error("column {0} does not exist in the log table")]
    UnknownColumn(String),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidArgument {
        key: String,
        value: String,
        reason: &'static str,
    },

    #[error("malformed invocation event: {0}")]
    MalformedEvent(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
