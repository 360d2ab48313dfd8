//! File-backed tabular store on SQLite.
//!
//! A [`Store`] owns one connection to one database file. Every file carries a `self`
//! table of key/value metadata with a mandatory `version` key that gates which clients
//! may open it. Tables are schema-agnostic: the store only knows their column lists,
//! which it reads from the catalog, and enforces first-column uniqueness when a table
//! is projected into a keyed view.

mod engine;
mod error;
mod meta;
mod projection;
mod rows;
mod schema;
mod transplant;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tabula_core::{
    coerce, Coercion, OpenMode, Reporter, StoreConfig, StoreEvent, TracingReporter, Value,
};

pub use error::{ErrorKind, Result, StoreError};
pub use tabula_core;

/// Name of the reserved metadata table present in every store.
pub const META_TABLE: &str = "self";

/// Metadata key holding the store's version.
pub const VERSION_KEY: &str = "version";

const CREATE_META_TABLE_SQL: &str = "CREATE TABLE self (key TEXT, value TEXT)";

/// Handle on one store file, owning its single connection until [`Store::close`].
pub struct Store {
    conn: Connection,
    config: StoreConfig,
    version: Value,
    reporter: Arc<dyn Reporter>,
}

impl Store {
    /// Create a fresh store at `path` stamped with `version`, replacing any file there.
    ///
    /// # Errors
    /// Returns [`StoreError::NotWritable`] when the path cannot be written, or an engine
    /// error when the store cannot be initialized.
    pub fn create(path: impl AsRef<Path>, version: i64) -> Result<Self> {
        Self::open_with(StoreConfig::create(path.as_ref(), version))
    }

    /// Open the existing store at `path`, gating on `expected_version` unless
    /// `ignore_version` is set.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when nothing exists at `path`,
    /// [`StoreError::NotRecognized`] when the file carries no version metadata, and
    /// [`StoreError::VersionNewer`] / [`StoreError::VersionOlder`] on a version mismatch.
    pub fn open(
        path: impl AsRef<Path>,
        expected_version: i64,
        ignore_version: bool,
    ) -> Result<Self> {
        let config = StoreConfig::open(path.as_ref(), expected_version);
        Self::open_with(config.ignore_version(ignore_version))
    }

    /// Open a store described by `config`, reporting through `tracing`.
    ///
    /// # Errors
    /// See [`Store::open_with_reporter`].
    pub fn open_with(config: StoreConfig) -> Result<Self> {
        Self::open_with_reporter(config, Arc::new(TracingReporter))
    }

    /// Open a store described by `config`, sending lifecycle and write events to
    /// `reporter`.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidConfig`] for an invalid configuration, otherwise the
    /// errors documented on [`Store::create`] and [`Store::open`] for the chosen mode.
    pub fn open_with_reporter(config: StoreConfig, reporter: Arc<dyn Reporter>) -> Result<Self> {
        config.validate()?;
        match config.mode {
            OpenMode::Create => Self::create_fresh(config, reporter),
            OpenMode::Open => Self::open_existing(config, reporter),
        }
    }

    fn create_fresh(config: StoreConfig, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let Some(version) = config.expected_version else {
            return Err(StoreError::InvalidConfig(
                "a version MUST be provided when creating a store".to_string(),
            ));
        };
        ensure_writable(&config.path)?;
        if config.path.exists() {
            fs::remove_file(&config.path)?;
        }

        let conn = Connection::open(&config.path)?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(CREATE_META_TABLE_SQL)?;

        let mut store = Self { conn, config, version: Value::Integer(version), reporter };
        store.set_meta(VERSION_KEY, version)?;
        store.report(StoreEvent::Created { path: store.config.path.clone(), version });
        Ok(store)
    }

    fn open_existing(config: StoreConfig, reporter: Arc<dyn Reporter>) -> Result<Self> {
        if !config.path.exists() {
            return Err(StoreError::NotFound(config.path));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&config.path, flags)?;

        let probed = conn
            .execute_batch("PRAGMA busy_timeout = 5000;")
            .map_err(StoreError::from)
            .and_then(|()| read_version(&conn));
        let Some(version) = probed.map_err(|err| match err {
            StoreError::Engine(source) if engine::is_not_a_database(&source) => {
                StoreError::NotRecognized(config.path.clone())
            }
            other => other,
        })?
        else {
            return Err(StoreError::NotRecognized(config.path));
        };

        if !config.ignore_version {
            if let Some(expected) = config.expected_version {
                check_version(&config.path, &version, expected)?;
            }
        }

        let store = Self { conn, config, version, reporter };
        store.report(StoreEvent::Opened {
            path: store.config.path.clone(),
            version: store.version.to_string(),
        });
        Ok(store)
    }

    /// Flush and release the connection.
    ///
    /// # Errors
    /// Returns an engine error when the connection cannot be closed cleanly.
    pub fn close(self) -> Result<()> {
        let Self { conn, config, reporter, .. } = self;
        conn.close().map_err(|(_, err)| StoreError::Engine(err))?;
        reporter.report(&StoreEvent::Closed { path: config.path });
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// The version stamped at creation or read at open.
    #[must_use]
    pub fn version(&self) -> &Value {
        &self.version
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn report(&self, event: StoreEvent) {
        self.reporter.report(&event);
    }
}

fn read_version(conn: &Connection) -> Result<Option<Value>> {
    if !engine::table_exists(conn, META_TABLE)? {
        return Ok(None);
    }
    for column in ["key", "value"] {
        if !engine::table_has_column(conn, META_TABLE, column)? {
            tracing::warn!(column, "metadata table is missing a column");
            return Ok(None);
        }
    }
    let value = conn
        .query_row(
            "SELECT value FROM self WHERE key = ?1 LIMIT 1",
            params![VERSION_KEY],
            |row| Ok(coerce(engine::raw_cell(row.get_ref(0)?), Coercion::IntegerText)),
        )
        .optional()?;
    Ok(value.filter(|version| !version.is_null()))
}

fn check_version(path: &Path, stored: &Value, expected: i64) -> Result<()> {
    let Some(stored) = stored.as_i64() else {
        return Err(StoreError::MalformedVersion {
            path: path.to_path_buf(),
            version: stored.to_string(),
        });
    };

    if stored > expected {
        tracing::warn!(path = %path.display(), stored, expected, "store is newer than client");
        return Err(StoreError::VersionNewer { path: path.to_path_buf(), stored, expected });
    }
    if stored < expected {
        tracing::warn!(path = %path.display(), stored, expected, "store is older than client");
        return Err(StoreError::VersionOlder { path: path.to_path_buf(), stored, expected });
    }
    Ok(())
}

fn ensure_writable(path: &Path) -> Result<()> {
    let not_writable = |reason: &str| StoreError::NotWritable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if path.is_dir() {
        return Err(not_writable("path is a directory"));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let Ok(parent_meta) = fs::metadata(parent) else {
        return Err(not_writable("parent directory does not exist"));
    };
    if !parent_meta.is_dir() {
        return Err(not_writable("parent is not a directory"));
    }
    if parent_meta.permissions().readonly() {
        return Err(not_writable("parent directory is read-only"));
    }

    if let Ok(meta) = fs::metadata(path) {
        if meta.permissions().readonly() {
            return Err(not_writable("existing file is read-only"));
        }
    }

    Ok(())
}
