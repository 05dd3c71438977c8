use serde::Serialize;

use super::event::{InvocationEvent, non_empty};
use crate::error::CoreError;

/// The request half of an audit row, extracted from an invocation event.
///
/// Structured facets are already serialized to JSON text; facets that are
/// absent or empty stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditRecord {
    pub username: Option<String>,
    pub path: String,
    pub domain_name: Option<String>,
    pub method: String,
    pub request_headers: Option<String>,
    pub request_body: Option<String>,
    pub query_string_parameters: Option<String>,
    pub path_parameters: Option<String>,
    pub cookies: Option<String>,
    pub raw_query_string: Option<String>,
    pub request_context: Option<String>,
    pub invocation_context: Option<String>,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub api_version: Option<String>,
    pub invocation_time: Option<String>,
    pub created_at: jiff::Timestamp,
}

impl NewAuditRecord {
    pub fn from_event(
        event: &InvocationEvent,
        invocation_context: &str,
        created_at: jiff::Timestamp,
    ) -> Result<Self, CoreError> {
        let (method, path) = event.route()?;
        let client_ip = event
            .client_ip()
            .ok_or_else(|| CoreError::MalformedEvent("no source ip in requestContext".into()))?
            .to_string();

        Ok(Self {
            username: event.username().map(str::to_string),
            path,
            domain_name: event.host().map(str::to_string),
            method,
            request_headers: json_text(&event.headers)?,
            request_body: json_text(&event.body_value())?,
            query_string_parameters: json_text(&event.query_string_parameters)?,
            path_parameters: json_text(&event.path_parameters)?,
            cookies: json_text(&event.cookies)?,
            raw_query_string: event.raw_query_string.clone().filter(|q| !q.is_empty()),
            request_context: json_text(&event.request_context)?,
            invocation_context: Some(invocation_context.to_string()).filter(|c| !c.is_empty()),
            client_ip,
            user_agent: event.user_agent().map(str::to_string),
            api_version: event.version.clone(),
            invocation_time: event.invocation_time().map(str::to_string),
            created_at,
        })
    }
}

/// Serialize a facet, or `None` when it is absent or empty.
fn json_text<T: Serialize>(value: &Option<T>) -> Result<Option<String>, CoreError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match non_empty(serde_json::to_value(value)?) {
        Some(v) => Ok(Some(serde_json::to_string(&v)?)),
        None => Ok(None),
    }
}
