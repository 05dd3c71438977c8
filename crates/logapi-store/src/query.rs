use std::collections::BTreeMap;

use logapi_core::column::{Column, TABLE};
use logapi_core::filter::{AuditFilter, FilterValue};
use logapi_core::render::RenderedRecord;
use logapi_secrets::credentials::DbMode;
use sqlx::{Any, QueryBuilder};
use tracing::{debug, error};

use crate::entity::AuditRecord;
use crate::error::{PersistenceContext, StoreError};
use crate::session::{Session, SessionFactory};

/// Result of a lookup that distinguishes "nothing matched" from an empty page.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(Vec<T>),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Self::NotFound
        } else {
            Self::Found(rows)
        }
    }
}

/// Equality filter over the audit table.
///
/// Every key other than `limit`/`offset` must name a column. Validation
/// happens before a read session is taken. Rows come back in insertion order.
pub async fn filter_records(
    factory: &SessionFactory,
    params: Option<&BTreeMap<String, String>>,
) -> Result<Lookup<RenderedRecord>, StoreError> {
    let filter = AuditFilter::parse(params)?;

    let mut session = factory.session(DbMode::Read).await?;
    let result = fetch(&mut session, &filter).await;
    session.finish(&result).await;

    match result {
        Ok(rows) => {
            debug!(matched = rows.len(), "audit filter evaluated");
            Ok(Lookup::from_rows(rows.iter().map(AuditRecord::render).collect()))
        }
        Err(e) => {
            error!(error = %e, "audit filter failed");
            Err(e)
        }
    }
}

async fn fetch(
    session: &mut Session,
    filter: &AuditFilter,
) -> Result<Vec<AuditRecord>, StoreError> {
    let mut qb =
        QueryBuilder::<Any>::new(format!("SELECT {} FROM {TABLE}", Column::select_list()));

    if !filter.conditions.is_empty() {
        qb.push(" WHERE ");
        let mut clauses = qb.separated(" AND ");
        for condition in &filter.conditions {
            clauses.push(condition.column.as_str());
            clauses.push_unseparated(" = ");
            match &condition.value {
                FilterValue::Integer(n) => clauses.push_bind_unseparated(*n),
                FilterValue::Text(s) => clauses.push_bind_unseparated(s.clone()),
            };
        }
    }

    qb.push(" ORDER BY id ASC");

    let skip = filter.skip();
    if filter.limit.is_some() || skip > 0 {
        qb.push(" LIMIT ");
        qb.push_bind(filter.limit.unwrap_or(i64::MAX));
        if skip > 0 {
            qb.push(" OFFSET ");
            qb.push_bind(skip);
        }
    }

    qb.build_query_as::<AuditRecord>()
        .fetch_all(session.connection())
        .await
        .during("filter audit records")
}
