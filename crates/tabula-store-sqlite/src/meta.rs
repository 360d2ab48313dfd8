//! Key/value metadata kept in the reserved `self` table.

use rusqlite::{params, OptionalExtension};
use tabula_core::{coerce, Coercion, StoreEvent, Value};

use crate::engine::raw_cell;
use crate::{Result, Store, StoreError};

impl Store {
    /// Read a metadata value, integer-coerced when its text parses as one.
    ///
    /// # Errors
    /// Returns [`StoreError::MetaKeyMissing`] when `key` is not set.
    pub fn get_meta(&self, key: &str) -> Result<Value> {
        self.meta(key)?.ok_or_else(|| StoreError::MetaKeyMissing(key.to_string()))
    }

    /// Read a metadata value, or `None` when `key` is not set.
    ///
    /// # Errors
    /// Returns an engine error when the metadata table cannot be read.
    pub fn meta(&self, key: &str) -> Result<Option<Value>> {
        let value = self
            .conn
            .query_row("SELECT value FROM self WHERE key = ?1 LIMIT 1", params![key], |row| {
                Ok(coerce(raw_cell(row.get_ref(0)?), Coercion::IntegerText))
            })
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// Values are persisted as text; `Null` is persisted as SQL NULL.
    ///
    /// # Errors
    /// Returns an engine error when the write fails.
    pub fn set_meta(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let text = (!value.is_null()).then(|| value.to_string());

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM self WHERE key = ?1", params![key])?;
        tx.execute("INSERT INTO self (key, value) VALUES (?1, ?2)", params![key, text])?;
        tx.commit()?;

        self.report(StoreEvent::MetaSet { key: key.to_string() });
        Ok(())
    }

    /// Same as [`Store::set_meta`]; reads better where an existing key is expected.
    ///
    /// # Errors
    /// Returns an engine error when the write fails.
    pub fn update_meta(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.remove_meta(key)?;
        self.set_meta(key, value)
    }

    /// Delete `key` if present.
    ///
    /// # Errors
    /// Returns an engine error when the delete fails.
    pub fn remove_meta(&mut self, key: &str) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM self WHERE key = ?1", params![key])?;
        if removed > 0 {
            self.report(StoreEvent::MetaRemoved { key: key.to_string() });
        }
        Ok(())
    }
}
