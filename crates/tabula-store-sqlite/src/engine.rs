//! Glue between `rusqlite` and the engine-free value type.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ErrorCode, Params, Statement, ToSql};
use tabula_core::{coerce, Coercion, RawCell, Value};

use crate::Result;

/// Binds a [`Value`] as a statement parameter without copying it.
pub(crate) struct Bind<'a>(pub(crate) &'a Value);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.0 {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(f) => ValueRef::Real(*f),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

pub(crate) fn bind_all(values: &[Value]) -> impl Params + '_ {
    rusqlite::params_from_iter(values.iter().map(Bind))
}

pub(crate) fn raw_cell(value: ValueRef<'_>) -> RawCell<'_> {
    match value {
        ValueRef::Null => RawCell::Null,
        ValueRef::Integer(i) => RawCell::Integer(i),
        ValueRef::Real(f) => RawCell::Real(f),
        ValueRef::Text(t) => RawCell::Text(t),
        ValueRef::Blob(b) => RawCell::Blob(b),
    }
}

/// Run a prepared query and collect every row as values under `policy`.
pub(crate) fn collect_rows<P: Params>(
    stmt: &mut Statement<'_>,
    params: P,
    policy: Coercion,
) -> Result<Vec<Vec<Value>>> {
    let width = stmt.column_count();
    let mut rows = stmt.query(params)?;
    let mut collected = Vec::new();

    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(coerce(raw_cell(row.get_ref(index)?), policy));
        }
        collected.push(values);
    }

    Ok(collected)
}

pub(crate) fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        params![table_name],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table_name: &str,
    column: &str,
) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
        params![table_name, column],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(exists == 1)
}

/// Whether the engine refused the file as not being a database at all.
pub(crate) fn is_not_a_database(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::NotADatabase
    )
}
