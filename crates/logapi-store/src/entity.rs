use logapi_core::models::record::NewAuditRecord;
use logapi_core::render::{
    Exchange, RenderedRecord, decode_json_field, display_timestamp, elapsed_seconds,
    store_timestamp,
};

/// One row of `log_apis`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: i64,
    pub username: Option<String>,
    pub path: String,
    pub domain_name: Option<String>,
    pub method: String,
    pub status_code: Option<i64>,
    pub request_headers: Option<String>,
    pub request_body: Option<String>,
    pub response_headers: Option<String>,
    pub response_body: Option<String>,
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
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl AuditRecord {
    /// The pending row as it stands right after insert.
    pub fn from_new(id: i64, new: NewAuditRecord) -> Self {
        Self {
            id,
            username: new.username,
            path: new.path,
            domain_name: new.domain_name,
            method: new.method,
            status_code: None,
            request_headers: new.request_headers,
            request_body: new.request_body,
            response_headers: None,
            response_body: None,
            query_string_parameters: new.query_string_parameters,
            path_parameters: new.path_parameters,
            cookies: new.cookies,
            raw_query_string: new.raw_query_string,
            request_context: new.request_context,
            invocation_context: new.invocation_context,
            client_ip: new.client_ip,
            user_agent: new.user_agent,
            api_version: new.api_version,
            invocation_time: new.invocation_time,
            created_at: store_timestamp(new.created_at),
            updated_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status_code.is_some()
    }

    pub fn render(&self) -> RenderedRecord {
        RenderedRecord {
            id: self.id,
            username: self.username.clone(),
            path: self.path.clone(),
            domain: self.domain_name.clone(),
            method: self.method.clone(),
            status_code: self.status_code,
            ip: self.client_ip.clone(),
            user_agent: self.user_agent.clone(),
            request: Exchange {
                headers: decode_json_field(self.request_headers.as_deref()),
                body: decode_json_field(self.request_body.as_deref()),
            },
            response: Exchange {
                headers: decode_json_field(self.response_headers.as_deref()),
                body: decode_json_field(self.response_body.as_deref()),
            },
            api_date: self.invocation_time.clone(),
            created_at: display_timestamp(&self.created_at),
            updated_at: self.updated_at.as_deref().map(display_timestamp),
            time: self
                .updated_at
                .as_deref()
                .and_then(|updated| elapsed_seconds(&self.created_at, updated)),
        }
    }
}
