//! The fixed column set of the `log_apis` table.
//!
//! Filter keys are checked against this set before any query is built, so an
//! unknown key never reaches the database.

use std::fmt;

pub const TABLE: &str = "log_apis";

/// How a filter value for a column is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Username,
    Path,
    DomainName,
    Method,
    StatusCode,
    RequestHeaders,
    RequestBody,
    ResponseHeaders,
    ResponseBody,
    QueryStringParameters,
    PathParameters,
    Cookies,
    RawQueryString,
    RequestContext,
    InvocationContext,
    ClientIp,
    UserAgent,
    ApiVersion,
    InvocationTime,
    CreatedAt,
    UpdatedAt,
}

impl Column {
    /// Every column, in table order.
    pub const ALL: [Column; 22] = [
        Column::Id,
        Column::Username,
        Column::Path,
        Column::DomainName,
        Column::Method,
        Column::StatusCode,
        Column::RequestHeaders,
        Column::RequestBody,
        Column::ResponseHeaders,
        Column::ResponseBody,
        Column::QueryStringParameters,
        Column::PathParameters,
        Column::Cookies,
        Column::RawQueryString,
        Column::RequestContext,
        Column::InvocationContext,
        Column::ClientIp,
        Column::UserAgent,
        Column::ApiVersion,
        Column::InvocationTime,
        Column::CreatedAt,
        Column::UpdatedAt,
    ];

    /// Column name as stored in the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Path => "path",
            Self::DomainName => "domain_name",
            Self::Method => "method",
            Self::StatusCode => "status_code",
            Self::RequestHeaders => "request_headers",
            Self::RequestBody => "request_body",
            Self::ResponseHeaders => "response_headers",
            Self::ResponseBody => "response_body",
            Self::QueryStringParameters => "query_string_parameters",
            Self::PathParameters => "path_parameters",
            Self::Cookies => "cookies",
            Self::RawQueryString => "raw_query_string",
            Self::RequestContext => "request_context",
            Self::InvocationContext => "invocation_context",
            Self::ClientIp => "client_ip",
            Self::UserAgent => "user_agent",
            Self::ApiVersion => "api_version",
            Self::InvocationTime => "invocation_time",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// camelCase alias accepted from clients that use the event naming.
    fn camel_name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Path => "path",
            Self::DomainName => "domainName",
            Self::Method => "method",
            Self::StatusCode => "statusCode",
            Self::RequestHeaders => "requestHeaders",
            Self::RequestBody => "requestBody",
            Self::ResponseHeaders => "responseHeaders",
            Self::ResponseBody => "responseBody",
            Self::QueryStringParameters => "queryStringParameters",
            Self::PathParameters => "pathParameters",
            Self::Cookies => "cookies",
            Self::RawQueryString => "rawQueryString",
            Self::RequestContext => "requestContext",
            Self::InvocationContext => "invocationContext",
            Self::ClientIp => "clientIp",
            Self::UserAgent => "userAgent",
            Self::ApiVersion => "apiVersion",
            Self::InvocationTime => "invocationTime",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    /// Look a column up by its table name or camelCase alias.
    pub fn from_name(name: &str) -> Option<Column> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == name || c.camel_name() == name)
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Id | Self::StatusCode => ColumnKind::Integer,
            _ => ColumnKind::Text,
        }
    }

    /// Comma-separated list of every column, for SELECT clauses.
    pub fn select_list() -> String {
        Self::ALL
            .iter()
            .map(Column::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
