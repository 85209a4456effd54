//! Column codecs for values `SQLite` has no native type for.
//!
//! Decimals are written as their canonical string form and timestamps as
//! RFC 3339 UTC strings. Both read back exactly as written.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// An exact decimal stored as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlDecimal(pub Decimal);

impl ToSql for SqlDecimal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for SqlDecimal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(_) => Decimal::from_str(value.as_str()?)
                .map(Self)
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            // Rows written by other tools may carry numeric cells.
            ValueRef::Integer(i) => Ok(Self(Decimal::from(i))),
            ValueRef::Real(f) => Decimal::try_from(f)
                .map(Self)
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A UTC timestamp stored as RFC 3339 TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlTimestamp(pub DateTime<Utc>);

impl ToSql for SqlTimestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(
            self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ))
    }
}

impl FromSql for SqlTimestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        DateTime::parse_from_rfc3339(value.as_str()?)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
