use tabula_core::{quote, CompiledPredicate, Coercion, Predicate, StoreEvent, Value};

use crate::engine::{self, bind_all, collect_rows};
use crate::{Result, Store, StoreError};

impl Store {
    /// Quoted name of `table`, after checking it against the catalog.
    pub(crate) fn checked_table(&self, table: &str) -> Result<String> {
        if engine::table_exists(&self.conn, table)? {
            Ok(quote(table))
        } else {
            Err(StoreError::UnknownTable(table.to_string()))
        }
    }

    fn checked_column(&self, table: &str, column: &str) -> Result<String> {
        if self.column_names(table)?.iter().any(|known| known == column) {
            Ok(quote(column))
        } else {
            Err(StoreError::UnknownColumn { table: table.to_string(), column: column.to_string() })
        }
    }

    fn table_info(&self, table: &str) -> Result<Vec<(String, String)>> {
        self.checked_table(table)?;
        let mut stmt = self.conn.prepare_cached("SELECT name, type FROM pragma_table_info(?1)")?;
        let rows = stmt.query_map([table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut info = Vec::new();
        for row in rows {
            info.push(row?);
        }
        Ok(info)
    }

    /// Column names of `table` in declaration order.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownTable`] when the table does not exist.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table_info(table)?.into_iter().map(|(name, _)| name).collect())
    }

    /// Declared column types of `table` in declaration order.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownTable`] when the table does not exist.
    pub fn column_types(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.table_info(table)?.into_iter().map(|(_, decl)| decl).collect())
    }

    /// Append one row.
    ///
    /// The engine checks the arity; a row of the wrong width is an engine error.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownTable`] or an engine error.
    pub fn insert(&mut self, table: &str, values: &[Value]) -> Result<()> {
        let quoted = self.checked_table(table)?;
        let sql = format!("INSERT INTO {quoted} VALUES ({})", placeholders(values.len()));
        self.conn.execute(&sql, bind_all(values))?;

        self.report(StoreEvent::RowsInserted { table: table.to_string(), rows: 1 });
        Ok(())
    }

    /// Append every row of `rows` in one transaction. An empty batch does nothing.
    ///
    /// # Errors
    /// Returns [`StoreError::ArityMismatch`] when a row is not as wide as the first one,
    /// [`StoreError::UnknownTable`], or an engine error. Nothing is written on error.
    pub fn insert_many(&mut self, table: &str, rows: &[Vec<Value>]) -> Result<()> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let width = first.len();
        if let Some((row, found)) =
            rows.iter().map(Vec::len).enumerate().find(|&(_, len)| len != width)
        {
            return Err(StoreError::ArityMismatch {
                table: table.to_string(),
                expected: width,
                found,
                row,
            });
        }

        let quoted = self.checked_table(table)?;
        let sql = format!("INSERT INTO {quoted} VALUES ({})", placeholders(width));
        write_rows(&mut self.conn, &sql, rows)?;

        tracing::debug!(table, rows = rows.len(), "inserted batch");
        self.report(StoreEvent::RowsInserted { table: table.to_string(), rows: rows.len() });
        Ok(())
    }

    /// Every row of `table`, in storage order.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownTable`] or an engine error.
    pub fn select_all(&self, table: &str) -> Result<Vec<Vec<Value>>> {
        let quoted = self.checked_table(table)?;
        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {quoted}"))?;
        collect_rows(&mut stmt, [], Coercion::Native)
    }

    /// Same rows as [`Store::select_all`].
    ///
    /// # Errors
    /// See [`Store::select_all`].
    pub fn table_as_rows(&self, table: &str) -> Result<Vec<Vec<Value>>> {
        self.select_all(table)
    }

    /// Rows of `table` matching `predicate`. No match is an empty result, not an error.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownTable`], [`StoreError::UnknownColumn`] for a structured
    /// predicate naming a missing column, or an engine error (for example a malformed raw
    /// expression).
    pub fn select_where(&self, table: &str, predicate: &Predicate) -> Result<Vec<Vec<Value>>> {
        self.fetch_where(table, predicate).map(|(rows, _)| rows)
    }

    /// Rows matching `predicate` together with the SQL text of the predicate.
    pub(crate) fn fetch_where(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> Result<(Vec<Vec<Value>>, String)> {
        let quoted = self.checked_table(table)?;
        let CompiledPredicate { sql, params } = self.compile(table, predicate)?;

        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {quoted} WHERE {sql}"))?;
        let rows = collect_rows(&mut stmt, bind_all(&params), Coercion::Native)?;
        tracing::debug!(table, predicate = %sql, rows = rows.len(), "filtered fetch");
        Ok((rows, sql))
    }

    /// Number of rows in `table`, restricted to `predicate` when one is given.
    ///
    /// # Errors
    /// Same as [`Store::select_where`].
    pub fn count_where(&self, table: &str, predicate: Option<&Predicate>) -> Result<usize> {
        let quoted = self.checked_table(table)?;
        let (sql, params) = match predicate {
            Some(predicate) => {
                let compiled = self.compile(table, predicate)?;
                (format!("SELECT COUNT(*) FROM {quoted} WHERE {}", compiled.sql), compiled.params)
            }
            None => (format!("SELECT COUNT(*) FROM {quoted}"), Vec::new()),
        };

        let count = self.conn.query_row(&sql, bind_all(&params), |row| row.get::<_, i64>(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Largest value stored in `column`, or `None` when the table has no non-null value
    /// there. Text that parses as an integer is returned as an integer.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownTable`], [`StoreError::UnknownColumn`], or an engine
    /// error.
    pub fn max_value(&self, table: &str, column: &str) -> Result<Option<Value>> {
        let quoted = self.checked_table(table)?;
        let column = self.checked_column(table, column)?;

        let mut stmt = self.conn.prepare(&format!("SELECT MAX({column}) FROM {quoted}"))?;
        let max = collect_rows(&mut stmt, [], Coercion::IntegerText)?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|value| !value.is_null());
        Ok(max)
    }

    /// Values of a single column, optionally de-duplicated and filtered.
    ///
    /// # Errors
    /// Returns [`StoreError::UnknownTable`], [`StoreError::UnknownColumn`], or an engine
    /// error.
    pub fn single_column(
        &self,
        table: &str,
        column: &str,
        distinct: bool,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Value>> {
        let quoted = self.checked_table(table)?;
        let column = self.checked_column(table, column)?;
        let distinct = if distinct { "DISTINCT " } else { "" };

        let mut sql = format!("SELECT {distinct}{column} FROM {quoted}");
        let mut params = Vec::new();
        if let Some(predicate) = predicate {
            let compiled = self.compile(table, predicate)?;
            sql.push_str(" WHERE ");
            sql.push_str(&compiled.sql);
            params = compiled.params;
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let values = collect_rows(&mut stmt, bind_all(&params), Coercion::Native)?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect();
        Ok(values)
    }

    fn compile(&self, table: &str, predicate: &Predicate) -> Result<CompiledPredicate> {
        let columns = match predicate {
            Predicate::Raw(_) => Vec::new(),
            _ => self.column_names(table)?,
        };
        Ok(predicate.compile(table, &columns)?)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Run `sql` once per row inside a single transaction on `conn`.
fn write_rows(
    conn: &mut rusqlite::Connection,
    sql: &str,
    rows: &[Vec<Value>],
) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(sql)?;
        for row in rows {
            stmt.execute(bind_all(row))?;
        }
    }
    tx.commit()?;
    Ok(())
}
