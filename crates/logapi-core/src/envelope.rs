//! The function response envelope.
//!
//! Every outcome, success or failure, leaves the function in the same shape:
//! a status code, a JSON content type, and a JSON body carrying `data`,
//! `error` and `message`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Created,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Conflict,
    UnsupportedMediaType,
    TooManyRequests,
    InternalError,
    ServiceUnavailable,
    GatewayTimeout,
}

impl Outcome {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::Created => 201,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::NotAcceptable => 406,
            Self::Conflict => 409,
            Self::UnsupportedMediaType => 415,
            Self::TooManyRequests => 429,
            Self::InternalError => 500,
            Self::ServiceUnavailable => 503,
            Self::GatewayTimeout => 504,
        }
    }

    pub fn is_error(self) -> bool {
        !matches!(self, Self::Success | Self::Created)
    }

    pub fn default_message(self) -> &'static str {
        match self {
            Self::Success | Self::Created => "Successful request",
            Self::BadRequest => "Bad request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Resource not found",
            Self::MethodNotAllowed => "Method not allowed",
            Self::NotAcceptable => "Not acceptable",
            Self::Conflict => "Conflict",
            Self::UnsupportedMediaType => "Unsupported media type",
            Self::TooManyRequests => "Too many requests",
            Self::InternalError => "Internal server error",
            Self::ServiceUnavailable => "Service unavailable",
            Self::GatewayTimeout => "Gateway timeout",
        }
    }
}

/// `{statusCode, headers, body}` as returned to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl Envelope {
    /// Build the envelope for `outcome`. Missing data renders as `[]`, a
    /// missing message as the outcome's default message.
    pub fn new(outcome: Outcome, data: Option<Value>, message: Option<&str>) -> Self {
        let body = json!({
            "data": data.unwrap_or_else(|| Value::Array(Vec::new())),
            "error": outcome.is_error(),
            "message": message.unwrap_or(outcome.default_message()),
        });

        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());

        Self {
            status_code: outcome.status_code(),
            headers,
            body: body.to_string(),
        }
    }

    pub fn from_outcome(outcome: Outcome) -> Self {
        Self::new(outcome, None, None)
    }

    pub fn success(data: Value) -> Self {
        Self::new(Outcome::Success, Some(data), None)
    }

    pub fn created(data: Value) -> Self {
        Self::new(Outcome::Created, Some(data), None)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(Outcome::BadRequest, None, Some(message))
    }

    pub fn not_found() -> Self {
        Self::from_outcome(Outcome::NotFound)
    }

    pub fn internal_error() -> Self {
        Self::from_outcome(Outcome::InternalError)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }

    /// The body parsed back into JSON, if it is JSON.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [(Outcome, u16, bool); 14] = [
        (Outcome::Success, 200, false),
        (Outcome::Created, 201, false),
        (Outcome::BadRequest, 400, true),
        (Outcome::Unauthorized, 401, true),
        (Outcome::Forbidden, 403, true),
        (Outcome::NotFound, 404, true),
        (Outcome::MethodNotAllowed, 405, true),
        (Outcome::NotAcceptable, 406, true),
        (Outcome::Conflict, 409, true),
        (Outcome::UnsupportedMediaType, 415, true),
        (Outcome::TooManyRequests, 429, true),
        (Outcome::InternalError, 500, true),
        (Outcome::ServiceUnavailable, 503, true),
        (Outcome::GatewayTimeout, 504, true),
    ];

    #[test]
    fn status_and_error_flag_per_outcome() {
        for (outcome, status, error) in TABLE {
            let envelope = Envelope::from_outcome(outcome);
            assert_eq!(envelope.status_code, status, "{outcome:?}");
            assert_eq!(envelope.is_error(), error, "{outcome:?}");

            let body = envelope.body_json().unwrap();
            assert_eq!(body["error"], json!(error), "{outcome:?}");
            assert_eq!(body["data"], json!([]));
            assert_eq!(body["message"], json!(outcome.default_message()));
            assert_eq!(
                envelope.headers.get(CONTENT_TYPE).map(String::as_str),
                Some(APPLICATION_JSON)
            );
        }
    }

    #[test]
    fn success_carries_data() {
        let envelope = Envelope::success(json!([{ "id": 1 }]));
        let body = envelope.body_json().unwrap();
        assert_eq!(body["data"], json!([{ "id": 1 }]));
        assert_eq!(body["error"], json!(false));
    }

    #[test]
    fn bad_request_carries_message() {
        let envelope = Envelope::bad_request("column nope does not exist");
        assert_eq!(envelope.status_code, 400);
        assert_eq!(
            envelope.body_json().unwrap()["message"],
            json!("column nope does not exist")
        );
    }

    #[test]
    fn serializes_in_platform_shape() {
        let value = serde_json::to_value(Envelope::not_found()).unwrap();
        assert_eq!(value["statusCode"], json!(404));
        assert_eq!(value["headers"]["Content-Type"], json!("application/json"));
        assert!(value["body"].is_string());
    }
}
