use logapi_core::column::{Column, TABLE};
use logapi_core::models::outcome::ResponseOutcome;
use logapi_core::render::store_timestamp;
use logapi_secrets::credentials::DbMode;
use sqlx::AnyConnection;
use tracing::{debug, error, info};

use crate::entity::AuditRecord;
use crate::error::{PersistenceContext, StoreError};
use crate::session::{Session, SessionFactory, abort};

const UPDATE_SQL: &str = "UPDATE log_apis SET status_code = ?, response_headers = ?, \
    response_body = ?, updated_at = ? WHERE id = ? AND status_code IS NULL";

/// Attach a handler's response to a previously recorded row.
///
/// With no outcome this is a no-op returning `Ok(None)`. Otherwise the row
/// is re-read inside a write transaction, updated and returned. A row is
/// completed at most once; a second completion is `AlreadyComplete`.
pub async fn complete_response(
    factory: &SessionFactory,
    record: &AuditRecord,
    outcome: Option<&ResponseOutcome>,
) -> Result<Option<AuditRecord>, StoreError> {
    let Some(outcome) = outcome else {
        debug!(id = record.id, "no response to attach, leaving record pending");
        return Ok(None);
    };

    let headers = outcome.headers_text()?;
    let body = outcome.body_text()?;
    let updated_at = store_timestamp(jiff::Timestamp::now());

    let mut session = factory.session(DbMode::Write).await?;
    let result = update(
        &mut session,
        record.id,
        outcome.status_code,
        headers,
        body,
        updated_at,
    )
    .await;
    session.finish(&result).await;

    match result {
        Ok(updated) => {
            info!(id = updated.id, status_code = outcome.status_code, "response recorded");
            Ok(Some(updated))
        }
        Err(e) => {
            error!(id = record.id, error = %e, "failed to record response");
            Err(e)
        }
    }
}

async fn update(
    session: &mut Session,
    id: i64,
    status_code: i64,
    headers: String,
    body: String,
    updated_at: String,
) -> Result<AuditRecord, StoreError> {
    let mut tx = session.begin().await?;

    match read_modify_write(&mut *tx, id, status_code, headers, body, updated_at).await {
        Ok(row) => {
            tx.commit().await.during("commit audit record")?;
            Ok(row)
        }
        Err(e) => {
            abort(tx, &e).await;
            Err(e)
        }
    }
}

async fn read_modify_write(
    conn: &mut AnyConnection,
    id: i64,
    status_code: i64,
    headers: String,
    body: String,
    updated_at: String,
) -> Result<AuditRecord, StoreError> {
    let select = format!("SELECT {} FROM {TABLE} WHERE id = ?", Column::select_list());
    let mut row: AuditRecord = sqlx::query_as(&select)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .during("load audit record")?
        .ok_or(StoreError::MissingRecord { id })?;
    if row.is_complete() {
        return Err(StoreError::AlreadyComplete { id });
    }

    let updated = sqlx::query(UPDATE_SQL)
        .bind(status_code)
        .bind(headers.as_str())
        .bind(body.as_str())
        .bind(updated_at.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await
        .during("update audit record")?;
    if updated.rows_affected() == 0 {
        return Err(StoreError::AlreadyComplete { id });
    }

    row.status_code = Some(status_code);
    row.response_headers = Some(headers);
    row.response_body = Some(body);
    row.updated_at = Some(updated_at);
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::record_request;
    use crate::schema::ensure_schema;
    use crate::session::PoolSettings;
    use logapi_core::models::event::InvocationEvent;
    use serde_json::json;

    async fn recorded() -> (SessionFactory, AuditRecord) {
        let factory = SessionFactory::from_url("sqlite::memory:", PoolSettings::single_connection());
        ensure_schema(&factory).await.unwrap();
        let event: InvocationEvent = serde_json::from_value(json!({
            "routeKey": "GET /x",
            "requestContext": { "http": { "sourceIp": "1.2.3.4" } }
        }))
        .unwrap();
        let record = record_request(&factory, &event, "").await.unwrap();
        (factory, record)
    }

    #[tokio::test]
    async fn no_outcome_is_a_noop() {
        let (factory, record) = recorded().await;
        assert_eq!(complete_response(&factory, &record, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn attaches_status_and_body() {
        let (factory, record) = recorded().await;
        let outcome = ResponseOutcome {
            status_code: 201,
            headers: Some(json!({ "Content-Type": "application/json" })),
            body: Some(json!({ "ok": true })),
        };

        let updated = complete_response(&factory, &record, Some(&outcome))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.status_code, Some(201));
        assert_eq!(updated.response_body.as_deref(), Some(r#"{"ok":true}"#));
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, record.created_at);
    }

    #[tokio::test]
    async fn completed_row_is_not_overwritten() {
        let (factory, record) = recorded().await;
        let first = ResponseOutcome {
            status_code: 200,
            headers: None,
            body: Some(json!({ "ok": true })),
        };
        let second = ResponseOutcome {
            status_code: 500,
            headers: None,
            body: None,
        };
        complete_response(&factory, &record, Some(&first))
            .await
            .unwrap();

        let err = complete_response(&factory, &record, Some(&second))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyComplete { id } if id == record.id));

        let mut session = factory.session(DbMode::Write).await.unwrap();
        let (status,): (Option<i64>,) =
            sqlx::query_as("SELECT status_code FROM log_apis WHERE id = ?")
                .bind(record.id)
                .fetch_one(session.connection())
                .await
                .unwrap();
        session.release();
        assert_eq!(status, Some(200));
    }

    #[tokio::test]
    async fn missing_row_is_reported() {
        let (factory, mut record) = recorded().await;
        record.id += 100;
        let outcome = ResponseOutcome {
            status_code: 200,
            headers: None,
            body: None,
        };
        let err = complete_response(&factory, &record, Some(&outcome))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingRecord { id } if id == record.id));
    }
}
