use logapi_core::envelope::Envelope;
use logapi_store::StoreError;

/// Unified error type for function handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    /// Every failure leaves the function as a well-formed envelope. Internal
    /// details are logged, never returned.
    pub fn into_envelope(self) -> Envelope {
        match self {
            ApiError::BadRequest(msg) => Envelope::bad_request(&msg),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                Envelope::internal_error()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(inner) => ApiError::BadRequest(inner.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logapi_core::error::CoreError;

    #[test]
    fn validation_errors_are_bad_requests() {
        let envelope =
            ApiError::from(StoreError::Validation(CoreError::UnknownColumn("nope".into())))
                .into_envelope();
        assert_eq!(envelope.status_code, 400);
        let body = envelope.body_json().unwrap();
        assert!(body["message"].as_str().unwrap().contains("nope"));
    }

    #[test]
    fn storage_errors_are_hidden() {
        let envelope = ApiError::from(StoreError::MissingRecord { id: 3 }).into_envelope();
        assert_eq!(envelope.status_code, 500);
        assert_eq!(envelope.body_json().unwrap()["message"], "Internal server error");
    }
}
