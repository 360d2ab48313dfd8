use tabula_core::{quote, validate_identifier, validate_type_decl, StoreEvent};

use crate::{engine, Result, Store, StoreError, META_TABLE};

impl Store {
    /// Create table `name` with one column per `(columns[i], types[i])` pair.
    ///
    /// # Errors
    /// Returns [`StoreError::SchemaMismatch`] when the two lists differ in length,
    /// [`StoreError::InvalidIdentifier`] for an unacceptable name or type declaration, and
    /// an engine error when the table cannot be created (for example because it exists).
    pub fn create_table<C, T>(&mut self, name: &str, columns: &[C], types: &[T]) -> Result<()>
    where
        C: AsRef<str>,
        T: AsRef<str>,
    {
        if columns.len() != types.len() {
            return Err(StoreError::SchemaMismatch {
                table: name.to_string(),
                columns: columns.len(),
                types: types.len(),
            });
        }
        validate_identifier(name)?;

        let mut fields = Vec::with_capacity(columns.len());
        for (column, decl) in columns.iter().zip(types) {
            let (column, decl) = (column.as_ref(), decl.as_ref());
            validate_identifier(column)?;
            validate_type_decl(decl)?;
            fields.push(format!("{} {}", quote(column), decl.trim()));
        }

        let sql = format!("CREATE TABLE {} ({})", quote(name), fields.join(", "));
        tracing::debug!(table = name, "creating table");
        self.conn.execute_batch(&sql)?;

        self.report(StoreEvent::TableCreated { table: name.to_string(), columns: columns.len() });
        Ok(())
    }

    /// Drop table `name` if it exists.
    ///
    /// # Errors
    /// Returns [`StoreError::ReservedTable`] for the metadata table,
    /// [`StoreError::InvalidIdentifier`] for an unacceptable name, or an engine error.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if name == META_TABLE {
            tracing::warn!(table = name, "refusing to drop the metadata table");
            return Err(StoreError::ReservedTable(name.to_string()));
        }
        validate_identifier(name)?;

        self.conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote(name)))?;
        self.report(StoreEvent::TableDropped { table: name.to_string() });
        Ok(())
    }

    /// Names of every table in the store, metadata table included, in catalog order.
    ///
    /// # Errors
    /// Returns an engine error when the catalog cannot be read.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Whether a table called `name` exists.
    ///
    /// # Errors
    /// Returns an engine error when the catalog cannot be read.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        engine::table_exists(&self.conn, name)
    }
}
