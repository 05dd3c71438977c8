use logapi_core::models::event::InvocationEvent;
use logapi_core::models::record::NewAuditRecord;
use logapi_core::render::store_timestamp;
use logapi_secrets::credentials::DbMode;
use sqlx::AnyConnection;
use tracing::{error, info};

use crate::entity::AuditRecord;
use crate::error::{PersistenceContext, StoreError};
use crate::session::{Session, SessionFactory, abort, is_sqlite};

const INSERT_SQL: &str = "INSERT INTO log_apis (\
    username, path, domain_name, method, request_headers, request_body, \
    query_string_parameters, path_parameters, cookies, raw_query_string, \
    request_context, invocation_context, client_ip, user_agent, api_version, \
    invocation_time, created_at\
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Persist the request half of an invocation as a pending audit row.
///
/// The event is validated before a session is taken. The insert runs in its
/// own transaction on the write database.
pub async fn record_request(
    factory: &SessionFactory,
    event: &InvocationEvent,
    invocation_context: &str,
) -> Result<AuditRecord, StoreError> {
    let new = NewAuditRecord::from_event(event, invocation_context, jiff::Timestamp::now())?;

    let mut session = factory.session(DbMode::Write).await?;
    let result = insert(&mut session, &new).await;
    session.finish(&result).await;

    match result {
        Ok(id) => {
            info!(id, method = %new.method, path = %new.path, "request recorded");
            Ok(AuditRecord::from_new(id, new))
        }
        Err(e) => {
            error!(error = %e, method = %new.method, path = %new.path, "failed to record request");
            Err(e)
        }
    }
}

async fn insert(session: &mut Session, new: &NewAuditRecord) -> Result<i64, StoreError> {
    let mut tx = session.begin().await?;

    let created_at = store_timestamp(new.created_at);
    let inserted = sqlx::query(INSERT_SQL)
        .bind(new.username.as_deref())
        .bind(new.path.as_str())
        .bind(new.domain_name.as_deref())
        .bind(new.method.as_str())
        .bind(new.request_headers.as_deref())
        .bind(new.request_body.as_deref())
        .bind(new.query_string_parameters.as_deref())
        .bind(new.path_parameters.as_deref())
        .bind(new.cookies.as_deref())
        .bind(new.raw_query_string.as_deref())
        .bind(new.request_context.as_deref())
        .bind(new.invocation_context.as_deref())
        .bind(new.client_ip.as_str())
        .bind(new.user_agent.as_deref())
        .bind(new.api_version.as_deref())
        .bind(new.invocation_time.as_deref())
        .bind(created_at.as_str())
        .execute(&mut *tx)
        .await
        .during("insert audit record");

    let id = match inserted {
        Ok(done) => inserted_id(&mut *tx, done.last_insert_id()).await,
        Err(e) => Err(e),
    };
    let id = match id {
        Ok(id) => id,
        Err(e) => {
            abort(tx, &e).await;
            return Err(e);
        }
    };

    tx.commit().await.during("commit audit record")?;
    Ok(id)
}

/// The id of the row just inserted on `conn`. The `Any` driver does not
/// report it for every engine, so it is read back on the same connection.
async fn inserted_id(
    conn: &mut AnyConnection,
    reported: Option<i64>,
) -> Result<i64, StoreError> {
    if let Some(id) = reported.filter(|id| *id > 0) {
        return Ok(id);
    }

    let sql = if is_sqlite(conn) {
        "SELECT last_insert_rowid()"
    } else {
        "SELECT CAST(LAST_INSERT_ID() AS SIGNED)"
    };
    let (id,): (i64,) = sqlx::query_as(sql)
        .fetch_one(&mut *conn)
        .await
        .during("read inserted id")?;

    if id > 0 {
        Ok(id)
    } else {
        Err(StoreError::MissingInsertId)
    }
}
