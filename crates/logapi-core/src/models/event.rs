use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// The HTTP API invocation event as delivered to a function.
///
/// Only the facets the audit log records are modelled; `requestContext` is
/// kept as raw JSON because it is stored verbatim and only a few nested
/// fields are ever read from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    #[serde(default)]
    pub version: Option<String>,
    /// `"METHOD /path"`
    #[serde(default)]
    pub route_key: Option<String>,
    #[serde(default)]
    pub raw_path: Option<String>,
    #[serde(default)]
    pub raw_query_string: Option<String>,
    #[serde(default)]
    pub cookies: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub path_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub request_context: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl InvocationEvent {
    /// Split the route key into `(method, path)`.
    pub fn route(&self) -> Result<(String, String), CoreError> {
        let route_key = self
            .route_key
            .as_deref()
            .ok_or_else(|| CoreError::MalformedEvent("missing routeKey".into()))?;

        let mut tokens = route_key.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(path), None) => Ok((method.to_string(), path.to_string())),
            _ => Err(CoreError::MalformedEvent(format!(
                "routeKey {route_key:?} is not \"METHOD /path\""
            ))),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Nested request context field, `None` as soon as any link is missing.
    pub fn context_str(&self, pointer: &str) -> Option<&str> {
        self.request_context.as_ref()?.pointer(pointer)?.as_str()
    }

    /// The `host` header, falling back to the context's domain name.
    pub fn host(&self) -> Option<&str> {
        self.header("host")
            .filter(|h| !h.is_empty())
            .or_else(|| self.context_str("/domainName"))
    }

    /// Caller address: the REST-style `identity.sourceIp`, else the HTTP API
    /// `http.sourceIp`.
    pub fn client_ip(&self) -> Option<&str> {
        self.context_str("/identity/sourceIp")
            .or_else(|| self.context_str("/http/sourceIp"))
    }

    pub fn username(&self) -> Option<&str> {
        self.context_str("/authorizer/jwt/claims/username")
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Platform-supplied request time.
    pub fn invocation_time(&self) -> Option<&str> {
        self.context_str("/time")
    }

    /// The body as structured JSON, or `None` when there is nothing to record.
    pub fn body_value(&self) -> Option<Value> {
        match self.body.as_ref()? {
            Value::String(s) if self.is_base64_encoded => non_empty(Value::String(s.clone())),
            Value::String(s) => parse_json_text(s),
            other => non_empty(other.clone()),
        }
    }
}

/// Text that holds JSON becomes that JSON; anything else stays a string.
pub fn parse_json_text(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    let value =
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
    non_empty(value)
}

/// Drops null and empty values.
pub fn non_empty(value: Value) -> Option<Value> {
    let empty = match &value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    };
    (!empty).then_some(value)
}
