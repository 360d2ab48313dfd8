use std::path::Path;

use tabula_core::{StoreConfig, StoreEvent};

use crate::engine::bind_all;
use crate::{Result, Store};

impl Store {
    /// Replace every row of `table` with the rows of the same table in the store at
    /// `source`. The source is opened without a version check and closed before this
    /// returns. An empty source table leaves the destination untouched.
    ///
    /// Returns the number of rows copied.
    ///
    /// # Errors
    /// Returns [`crate::StoreError::UnknownTable`] when either side lacks `table`, the open
    /// errors of [`Store::open`] for `source`, or an engine error when the source rows do
    /// not fit the destination. The destination is unchanged on error.
    pub fn copy_table(&mut self, table: &str, source: impl AsRef<Path>) -> Result<usize> {
        let source = source.as_ref();
        let quoted = self.checked_table(table)?;

        let donor =
            Store::open_with_reporter(StoreConfig::open_any_version(source), self.reporter.clone())?;
        let fetched = donor.select_all(table);
        let closed = donor.close();
        let rows = fetched?;
        closed?;

        if rows.is_empty() {
            self.report(StoreEvent::CopySkipped {
                table: table.to_string(),
                source: source.to_path_buf(),
            });
            return Ok(0);
        }

        let width = rows.first().map_or(0, Vec::len);
        let insert = format!("INSERT INTO {quoted} VALUES ({})", vec!["?"; width].join(", "));

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {quoted}"), [])?;
        {
            let mut stmt = tx.prepare_cached(&insert)?;
            for row in &rows {
                stmt.execute(bind_all(row))?;
            }
        }
        tx.commit()?;

        tracing::debug!(table, source = %source.display(), rows = rows.len(), "table replaced");
        self.report(StoreEvent::TableCopied {
            table: table.to_string(),
            source: source.to_path_buf(),
            rows: rows.len(),
        });
        Ok(rows.len())
    }
}
