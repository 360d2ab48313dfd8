//! Dictionary and frame views over a whole table or a predicate-filtered slice.

use tabula_core::{
    check_unique_keys, Frame, Predicate, ResolvedView, TableDict, Value, ViewSpec,
};

use crate::{Result, Store, StoreError};

impl Store {
    /// Project `table` into a dictionary keyed by its first column.
    ///
    /// # Errors
    /// Returns [`StoreError::EmptyProjection`] when only the key column survives and
    /// `spec.error_if_empty` is set, [`StoreError::IntegrityViolation`] when first-column
    /// values repeat in a non-exempt table, and [`StoreError::StructureMismatch`] when a
    /// caller-supplied structure does not match the stored rows.
    pub fn as_dict(&self, table: &str, spec: &ViewSpec) -> Result<TableDict> {
        let Some((view, rows)) = self.project(table, spec)? else {
            return Ok(TableDict::new());
        };
        Ok(view.to_dict(spec, rows))
    }

    /// Project `table` into a frame that keeps the key as its first column.
    ///
    /// An empty projection with `spec.error_if_empty` unset yields an empty frame.
    ///
    /// # Errors
    /// Same as [`Store::as_dict`].
    pub fn as_frame(&self, table: &str, spec: &ViewSpec) -> Result<Frame> {
        let Some((view, rows)) = self.project(table, spec)? else {
            return Ok(Frame::default());
        };
        Ok(view.to_frame(spec, rows))
    }

    /// Dictionary view of the rows matching `predicate`.
    ///
    /// Filtered slices are not held to the first-column uniqueness invariant; when keys
    /// repeat the last matching row wins.
    ///
    /// # Errors
    /// Returns [`StoreError::EmptyResult`] when nothing matches and `error_if_empty` is
    /// set, plus the errors of [`Store::select_where`].
    pub fn some_rows_as_dict(
        &self,
        table: &str,
        predicate: &Predicate,
        error_if_empty: bool,
        stringify_key: bool,
    ) -> Result<TableDict> {
        let (rows, sql) = self.fetch_where(table, predicate)?;
        if rows.is_empty() {
            if error_if_empty {
                return Err(StoreError::EmptyResult { table: table.to_string(), predicate: sql });
            }
            return Ok(TableDict::new());
        }

        let view = ResolvedView::all_columns(table, self.column_names(table)?);
        let spec = ViewSpec::new().stringify_key(stringify_key);
        Ok(view.to_dict(&spec, rows))
    }

    fn project(
        &self,
        table: &str,
        spec: &ViewSpec,
    ) -> Result<Option<(ResolvedView, Vec<Vec<Value>>)>> {
        let structure = match &spec.structure {
            Some(structure) => structure.clone(),
            None => self.column_names(table)?,
        };
        let Some(view) = spec.resolve(table, structure, &self.config.parent_column)? else {
            tracing::debug!(table, "projection left no data columns");
            return Ok(None);
        };

        let rows = self.select_all(table)?;
        if !self.config.is_exempt(table) {
            check_unique_keys(table, &rows).map_err(|err| {
                tracing::warn!(table, error = %err, "first-column uniqueness violated");
                StoreError::from(err)
            })?;
        }
        view.check_arity(&rows)?;

        Ok(Some((view, rows)))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use tabula_core::StoreConfig;
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;

    fn contigs(config: StoreConfig) -> Result<Store> {
        let mut store = Store::open_with(config)?;
        store.create_table(
            "contigs",
            &["contig", "length", "gc", "__parent__"],
            &["text", "integer", "real", "text"],
        )?;
        store.insert_many(
            "contigs",
            &[
                vec!["c_1".into(), 5000_i64.into(), 0.41.into(), Value::Null],
                vec!["c_2".into(), 3200_i64.into(), 0.38.into(), "c_1".into()],
            ],
        )?;
        Ok(store)
    }

    #[test]
    fn dict_omits_parent_column_on_request() -> Result<()> {
        let dir = TempDir::new()?;
        let store = contigs(StoreConfig::create(dir.path().join("p.db"), 1))?;

        let dict = store.as_dict("contigs", &ViewSpec::new().omit_parent_column(true))?;
        let Some(entry) = dict.get(&Value::from("c_2")) else {
            return Err(anyhow!("c_2 missing from dictionary view"));
        };
        assert_eq!(entry.keys().collect::<Vec<_>>(), vec!["gc", "length"]);
        Ok(())
    }

    #[test]
    fn caller_structure_renames_columns() -> Result<()> {
        let dir = TempDir::new()?;
        let store = contigs(StoreConfig::create(dir.path().join("p.db"), 1))?;

        let spec = ViewSpec::new().structure(["name", "len", "gc_content", "parent"]).columns(["len"]);
        let dict = store.as_dict("contigs", &spec)?;
        let entry = dict.get(&Value::from("c_1")).and_then(|entry| entry.get("len"));
        assert_eq!(entry, Some(&Value::Integer(5000)));

        let Err(err) = store.as_dict("contigs", &ViewSpec::new().structure(["name", "len"])) else {
            return Err(anyhow!("expected a short structure to be rejected"));
        };
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        Ok(())
    }

    #[test]
    fn empty_projection_can_be_tolerated() -> Result<()> {
        let dir = TempDir::new()?;
        let store = contigs(StoreConfig::create(dir.path().join("p.db"), 1))?;

        let spec = ViewSpec::new().columns(["no_such_column"]).error_if_empty(false);
        assert!(store.as_dict("contigs", &spec)?.is_empty());
        assert!(store.as_frame("contigs", &spec)?.is_empty());
        Ok(())
    }

    #[test]
    fn exempt_tables_skip_the_uniqueness_check() -> Result<()> {
        let dir = TempDir::new()?;
        let config = StoreConfig::create(dir.path().join("p.db"), 1).exempt_table("contigs");
        let mut store = contigs(config)?;
        store.insert("contigs", &["c_1".into(), 10_i64.into(), 0.5.into(), Value::Null])?;

        let dict = store.as_dict("contigs", &ViewSpec::new())?;
        assert_eq!(dict.len(), 2);
        let frame = store.as_frame("contigs", &ViewSpec::new())?;
        assert_eq!(frame.len(), 3);
        Ok(())
    }

    #[test]
    fn filtered_fetch_reports_empty_results() -> Result<()> {
        let dir = TempDir::new()?;
        let store = contigs(StoreConfig::create(dir.path().join("p.db"), 1))?;

        let predicate = Predicate::raw("length > 100000");
        let Err(err) = store.some_rows_as_dict("contigs", &predicate, true, false) else {
            return Err(anyhow!("expected an empty result"));
        };
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
        assert!(err.to_string().contains("length > 100000"));
        assert!(store.some_rows_as_dict("contigs", &predicate, false, false)?.is_empty());

        let dict = store.some_rows_as_dict("contigs", &Predicate::raw("gc < 0.4"), true, true)?;
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec![&Value::from("c_2")]);
        Ok(())
    }
}
