//! Filter validation for audit log queries.
//!
//! A filter arrives as a flat string mapping (usually the query string of
//! the log endpoint). `limit` and `offset` control pagination; every other
//! key must name a column and becomes an equality condition.

use std::collections::BTreeMap;

use crate::column::{Column, ColumnKind};
use crate::error::CoreError;

pub const LIMIT_KEY: &str = "limit";
pub const OFFSET_KEY: &str = "offset";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Integer(i64),
    Text(String),
}

/// `column = value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: Column,
    pub value: FilterValue,
}

/// A validated filter, ready to be turned into a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub conditions: Vec<Condition>,
    pub limit: Option<i64>,
    /// Rows to skip, already converted from the client's 1-based offset.
    pub offset: Option<i64>,
}

impl AuditFilter {
    /// Validate a raw filter mapping.
    ///
    /// Pagination is checked before columns, and the first unknown key (in
    /// key order) is the one reported.
    pub fn parse(params: Option<&BTreeMap<String, String>>) -> Result<Self, CoreError> {
        let params = match params {
            Some(p) if !p.is_empty() => p,
            _ => return Err(CoreError::MissingFilter),
        };

        let limit = parse_pagination(params, LIMIT_KEY)?;
        // 1-based from the client; offset=0 and offset=1 both skip nothing.
        let offset = parse_pagination(params, OFFSET_KEY)?.map(|o| (o - 1).max(0));

        let mut conditions = Vec::new();
        for (key, value) in params {
            if key == LIMIT_KEY || key == OFFSET_KEY {
                continue;
            }
            let column =
                Column::from_name(key).ok_or_else(|| CoreError::UnknownColumn(key.clone()))?;
            let value = match column.kind() {
                ColumnKind::Text => FilterValue::Text(value.clone()),
                ColumnKind::Integer => FilterValue::Integer(value.trim().parse().map_err(
                    |_| CoreError::InvalidArgument {
                        key: key.clone(),
                        value: value.clone(),
                        reason: "expected an integer",
                    },
                )?),
            };
            conditions.push(Condition { column, value });
        }

        Ok(Self {
            conditions,
            limit,
            offset,
        })
    }

    /// Number of rows skipped before the first returned row.
    pub fn skip(&self) -> i64 {
        self.offset.unwrap_or(0)
    }
}

/// An empty value counts as absent.
fn parse_pagination(
    params: &BTreeMap<String, String>,
    key: &str,
) -> Result<Option<i64>, CoreError> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(Some(n)),
        _ => Err(CoreError::InvalidArgument {
            key: key.to_string(),
            value: raw.clone(),
            reason: "expected a non-negative integer",
        }),
    }
}
