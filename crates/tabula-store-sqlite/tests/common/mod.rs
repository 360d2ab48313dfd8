//! Shared fixtures for the store integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tabula_store_sqlite::tabula_core::{Reporter, StoreConfig, StoreEvent, Value};
use tabula_store_sqlite::Store;
use tempfile::TempDir;

/// A temporary directory holding one freshly created store.
#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub db_path: PathBuf,
    pub store: Store,
}

#[allow(dead_code)]
impl TestContext {
    /// Create a context whose store is stamped with `version`.
    pub fn new(version: i64) -> Result<Self> {
        Self::with_config(|path| StoreConfig::create(path, version))
    }

    /// Create a context from a configuration built for the context's store path.
    pub fn with_config(config: impl FnOnce(PathBuf) -> StoreConfig) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");
        let store = Store::open_with(config(db_path.clone()))?;
        Ok(Self { temp_dir, db_path, store })
    }

    /// Path for a sibling file inside the context's directory.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Create a second store next to this one holding `table` with `rows`.
    pub fn sibling_store(
        &self,
        name: &str,
        version: i64,
        table: &str,
        columns: &[&str],
        types: &[&str],
        rows: &[Vec<Value>],
    ) -> Result<PathBuf> {
        let path = self.sibling(name);
        let mut store = Store::create(&path, version)?;
        store.create_table(table, columns, types)?;
        store.insert_many(table, rows)?;
        store.close()?;
        Ok(path)
    }

    /// Close the store and hand back the directory and path for reopening.
    pub fn close(self) -> Result<(TempDir, PathBuf)> {
        self.store.close()?;
        Ok((self.temp_dir, self.db_path))
    }
}

/// A `[id, c1, c2, c3]` table with three distinct keys.
#[allow(dead_code)]
pub fn four_column_table(store: &mut Store, table: &str) -> Result<()> {
    store.create_table(table, &["id", "c1", "c2", "c3"], &["integer", "text", "text", "real"])?;
    store.insert_many(
        table,
        &[
            vec![1_i64.into(), "a".into(), "x".into(), 0.5.into()],
            vec![2_i64.into(), "b".into(), "y".into(), 1.5.into()],
            vec![3_i64.into(), "c".into(), "z".into(), 2.5.into()],
        ],
    )?;
    Ok(())
}

/// Reporter that keeps every event it receives.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingReporter {
    events: Mutex<Vec<StoreEvent>>,
}

#[allow(dead_code)]
impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &StoreEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
