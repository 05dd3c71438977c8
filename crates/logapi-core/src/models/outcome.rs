use serde_json::Value;

use super::event::parse_json_text;
use crate::envelope::Envelope;
use crate::error::CoreError;

/// What a handler answered, in the form the audit row stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub status_code: i64,
    pub headers: Option<Value>,
    pub body: Option<Value>,
}

impl ResponseOutcome {
    /// Headers as JSON text. Absent headers serialize as `null`.
    pub fn headers_text(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(&self.headers)?)
    }

    /// Body as JSON text. An absent body serializes as `null`.
    pub fn body_text(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(&self.body)?)
    }
}

impl From<&Envelope> for ResponseOutcome {
    fn from(envelope: &Envelope) -> Self {
        let headers = (!envelope.headers.is_empty()).then(|| {
            Value::Object(
                envelope
                    .headers
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )
        });

        Self {
            status_code: i64::from(envelope.status_code),
            headers,
            body: parse_json_text(&envelope.body),
        }
    }
}
