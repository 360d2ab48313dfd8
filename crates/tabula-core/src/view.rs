//! Read-side projections of a table.
//!
//! A [`ViewSpec`] is resolved against a table's column list into a [`ResolvedView`]; rows
//! fetched by the store are then shaped into either a [`TableDict`] (first column as the
//! key) or a [`Frame`] (first column kept as ordinary data).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{CoreError, Value};

/// Column name to value for one row, key column excluded.
pub type Entry = BTreeMap<String, Value>;

/// Rows keyed by their first-column value.
pub type TableDict = BTreeMap<Value, Entry>;

/// Caller parameters for a dictionary or frame projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewSpec {
    /// Column list to use instead of the catalog's.
    #[serde(default)]
    pub structure: Option<Vec<String>>,
    #[serde(default)]
    pub stringify_key: bool,
    /// Allow-list applied to every column after the key column.
    #[serde(default)]
    pub columns_of_interest: Option<Vec<String>>,
    /// Allow-list of first-column values. `Some` of an empty list matches no row; use
    /// `None` for no filtering.
    #[serde(default)]
    pub keys_of_interest: Option<Vec<Value>>,
    #[serde(default)]
    pub omit_parent_column: bool,
    #[serde(default = "default_true")]
    pub error_if_empty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ViewSpec {
    fn default() -> Self {
        Self {
            structure: None,
            stringify_key: false,
            columns_of_interest: None,
            keys_of_interest: None,
            omit_parent_column: false,
            error_if_empty: true,
        }
    }
}

impl ViewSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn structure<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.structure = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn stringify_key(mut self, stringify: bool) -> Self {
        self.stringify_key = stringify;
        self
    }

    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns_of_interest = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn keys<I, V>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.keys_of_interest = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn omit_parent_column(mut self, omit: bool) -> Self {
        self.omit_parent_column = omit;
        self
    }

    #[must_use]
    pub fn error_if_empty(mut self, error: bool) -> Self {
        self.error_if_empty = error;
        self
    }

    /// Resolve this view against `structure`, the table's full column list.
    ///
    /// Returns `Ok(None)` when nothing but the key column survives and the caller opted
    /// out of the error.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyProjection`] when nothing but the key column survives and
    /// `error_if_empty` is set.
    pub fn resolve(
        &self,
        table: &str,
        structure: Vec<String>,
        parent_column: &str,
    ) -> Result<Option<ResolvedView>, CoreError> {
        let selected = (1..structure.len())
            .filter(|&index| {
                let name = &structure[index];
                if self.omit_parent_column && name == parent_column {
                    return false;
                }
                self.columns_of_interest
                    .as_ref()
                    .map_or(true, |wanted| wanted.iter().any(|column| column == name))
            })
            .collect::<Vec<_>>();

        if selected.is_empty() {
            if self.error_if_empty {
                return Err(CoreError::EmptyProjection { table: table.to_string() });
            }
            return Ok(None);
        }

        Ok(Some(ResolvedView { table: table.to_string(), structure, selected }))
    }

    fn key_filter(&self) -> Option<BTreeSet<Value>> {
        self.keys_of_interest.as_ref().map(|keys| keys.iter().cloned().collect())
    }
}

/// A table's column list plus the positions of the data columns a projection keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedView {
    table: String,
    structure: Vec<String>,
    selected: Vec<usize>,
}

impl ResolvedView {
    /// A view keeping every column after the key.
    #[must_use]
    pub fn all_columns(table: &str, structure: Vec<String>) -> Self {
        let selected = (1..structure.len()).collect();
        Self { table: table.to_string(), structure, selected }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn structure(&self) -> &[String] {
        &self.structure
    }

    /// Names of the kept data columns, in table order.
    #[must_use]
    pub fn selected_columns(&self) -> Vec<&str> {
        self.selected.iter().map(|&index| self.structure[index].as_str()).collect()
    }

    /// Check that every row has one value per column in the structure.
    ///
    /// # Errors
    /// Returns [`CoreError::StructureMismatch`] for the first row of a different arity.
    pub fn check_arity(&self, rows: &[Vec<Value>]) -> Result<(), CoreError> {
        match rows.iter().find(|row| row.len() != self.structure.len()) {
            Some(row) => Err(CoreError::StructureMismatch {
                table: self.table.clone(),
                expected: self.structure.len(),
                found: row.len(),
            }),
            None => Ok(()),
        }
    }

    /// Shape rows into a dictionary keyed by the first column.
    ///
    /// Rows are expected to have passed [`ResolvedView::check_arity`]. When several rows
    /// share a key the last one kept wins.
    #[must_use]
    pub fn to_dict(&self, spec: &ViewSpec, rows: Vec<Vec<Value>>) -> TableDict {
        let mut wanted = spec.key_filter();
        let mut dict = TableDict::new();

        for row in rows {
            let Some(key) = row.first() else {
                continue;
            };
            if let Some(wanted) = wanted.as_mut() {
                // Matched keys leave the working set; later rows with the same key are skipped.
                if !wanted.remove(key) {
                    continue;
                }
            }

            let key = if spec.stringify_key { key.stringified() } else { key.clone() };
            let entry = self
                .selected
                .iter()
                .filter_map(|&index| {
                    row.get(index).map(|value| (self.structure[index].clone(), value.clone()))
                })
                .collect::<Entry>();
            dict.insert(key, entry);
        }

        dict
    }

    /// Shape rows into a frame that keeps the key column as its first column.
    #[must_use]
    pub fn to_frame(&self, spec: &ViewSpec, rows: Vec<Vec<Value>>) -> Frame {
        let wanted = spec.key_filter();
        let positions = std::iter::once(0).chain(self.selected.iter().copied()).collect::<Vec<_>>();
        let columns = positions.iter().map(|&index| self.structure[index].clone()).collect();

        let rows = rows
            .into_iter()
            .filter(|row| match (&wanted, row.first()) {
                (Some(wanted), Some(key)) => wanted.contains(key),
                (None, _) => true,
                (Some(_), None) => false,
            })
            .map(|mut row| {
                positions
                    .iter()
                    .map(|&index| row.get_mut(index).map(std::mem::take).unwrap_or_default())
                    .collect()
            })
            .collect();

        Frame { columns, rows }
    }
}

/// Verify that the first-column values of `rows` are pairwise distinct.
///
/// Keys are compared numerically, so `Integer(1)` and `Real(1.0)` count as one key.
///
/// # Errors
/// Returns [`CoreError::IntegrityViolation`] with the row and distinct-key counts when
/// some key repeats.
pub fn check_unique_keys(table: &str, rows: &[Vec<Value>]) -> Result<(), CoreError> {
    let unique_keys =
        rows.iter().filter_map(|row| row.first()).map(numeric_key).collect::<BTreeSet<_>>().len();
    if unique_keys == rows.len() {
        Ok(())
    } else {
        Err(CoreError::IntegrityViolation { table: table.to_string(), rows: rows.len(), unique_keys })
    }
}

/// Integral reals fold onto the matching integer; every other value is kept as is.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::float_cmp)]
fn numeric_key(value: &Value) -> Value {
    match value {
        Value::Real(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Value::Integer(*f as i64)
        }
        other => other.clone(),
    }
}

/// Column-major-labelled, row-major-stored tabular result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// All values of one column, top to bottom.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Rows as name-to-value maps, key column included.
    #[must_use]
    pub fn records(&self) -> Vec<Entry> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}
