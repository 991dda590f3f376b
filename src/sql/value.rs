//! The SQL value type exchanged with script.

use rusqlite::types::{Value as RusqliteValue, ValueRef};

/// A column value. Byte-slice (`BLOB`) values are coerced to UTF-8 strings
/// in results.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// An integer, stored as SQLite's native 64-bit width.
    Integer(i64),
    /// A floating-point number.
    Real(f64),
    /// Text, or a blob coerced to UTF-8 (lossily, if it is not valid UTF-8).
    Text(String),
}

impl SqlValue {
    pub(crate) fn from_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Real(f),
            ValueRef::Text(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Self::Text(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        let value = match self {
            Self::Null => RusqliteValue::Null,
            Self::Integer(i) => RusqliteValue::Integer(*i),
            Self::Real(f) => RusqliteValue::Real(*f),
            Self::Text(s) => RusqliteValue::Text(s.clone()),
        };
        Ok(rusqlite::types::ToSqlOutput::Owned(value))
    }
}
