use logapi_secrets::credentials::DbMode;
use tracing::info;

use crate::error::{PersistenceContext, StoreError};
use crate::session::{SessionFactory, is_sqlite};

const MYSQL_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS log_apis (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    username VARCHAR(255) NULL,
    path VARCHAR(2048) NOT NULL,
    domain_name VARCHAR(255) NULL,
    method VARCHAR(16) NOT NULL,
    status_code BIGINT NULL,
    request_headers TEXT NULL,
    request_body LONGTEXT NULL,
    response_headers TEXT NULL,
    response_body LONGTEXT NULL,
    query_string_parameters TEXT NULL,
    path_parameters TEXT NULL,
    cookies TEXT NULL,
    raw_query_string TEXT NULL,
    request_context TEXT NULL,
    invocation_context TEXT NULL,
    client_ip VARCHAR(64) NOT NULL,
    user_agent TEXT NULL,
    api_version VARCHAR(16) NULL,
    invocation_time VARCHAR(64) NULL,
    created_at VARCHAR(40) NOT NULL,
    updated_at VARCHAR(40) NULL
)
"#;

const SQLITE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS log_apis (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT,
    path TEXT NOT NULL,
    domain_name TEXT,
    method TEXT NOT NULL,
    status_code INTEGER,
    request_headers TEXT,
    request_body TEXT,
    response_headers TEXT,
    response_body TEXT,
    query_string_parameters TEXT,
    path_parameters TEXT,
    cookies TEXT,
    raw_query_string TEXT,
    request_context TEXT,
    invocation_context TEXT,
    client_ip TEXT NOT NULL,
    user_agent TEXT,
    api_version TEXT,
    invocation_time TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT
)
"#;

/// Create the `log_apis` table on the write database if it is missing.
pub async fn ensure_schema(factory: &SessionFactory) -> Result<(), StoreError> {
    let mut session = factory.session(DbMode::Write).await?;

    let backend = session.connection().backend_name().to_string();
    let ddl = if is_sqlite(session.connection()) {
        SQLITE_DDL
    } else {
        MYSQL_DDL
    };

    let result = sqlx::query(ddl)
        .execute(session.connection())
        .await
        .map(|_| ())
        .during("create log table");
    session.finish(&result).await;
    result?;

    info!(backend = %backend, "log table ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::PoolSettings;

    #[tokio::test]
    async fn schema_bootstrap_is_idempotent() {
        let factory = SessionFactory::from_url("sqlite::memory:", PoolSettings::single_connection());
        ensure_schema(&factory).await.unwrap();
        ensure_schema(&factory).await.unwrap();

        let mut session = factory.session(DbMode::Read).await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM log_apis")
            .fetch_one(session.connection())
            .await
            .unwrap();
        session.release();
        assert_eq!(count.0, 0);
    }
}
