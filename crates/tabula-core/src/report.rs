use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Something a store handle did that a caller may want to surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { path: PathBuf, version: i64 },
    Opened { path: PathBuf, version: String },
    Closed { path: PathBuf },
    MetaSet { key: String },
    MetaRemoved { key: String },
    TableCreated { table: String, columns: usize },
    TableDropped { table: String },
    RowsInserted { table: String, rows: usize },
    TableCopied { table: String, source: PathBuf, rows: usize },
    CopySkipped { table: String, source: PathBuf },
}

impl Display for StoreEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created { path, version } => {
                write!(f, "created store {} at version {version}", path.display())
            }
            Self::Opened { path, version } => {
                write!(f, "opened store {} at version {version}", path.display())
            }
            Self::Closed { path } => write!(f, "closed store {}", path.display()),
            Self::MetaSet { key } => write!(f, "set meta key {key}"),
            Self::MetaRemoved { key } => write!(f, "removed meta key {key}"),
            Self::TableCreated { table, columns } => {
                write!(f, "created table {table} with {columns} columns")
            }
            Self::TableDropped { table } => write!(f, "dropped table {table}"),
            Self::RowsInserted { table, rows } => write!(f, "inserted {rows} rows into {table}"),
            Self::TableCopied { table, source, rows } => {
                write!(f, "copied {rows} rows of {table} from {}", source.display())
            }
            Self::CopySkipped { table, source } => {
                write!(f, "{table} is empty in {}; nothing copied", source.display())
            }
        }
    }
}

/// Receives [`StoreEvent`]s from a store handle.
///
/// Handed to the store when it is opened; the caller decides where events go.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &StoreEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &StoreEvent) {
        match event {
            StoreEvent::Created { .. } | StoreEvent::Opened { .. } | StoreEvent::Closed { .. } => {
                tracing::info!(target: "tabula", "{event}");
            }
            StoreEvent::CopySkipped { .. } => tracing::warn!(target: "tabula", "{event}"),
            _ => tracing::debug!(target: "tabula", "{event}"),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn report(&self, _event: &StoreEvent) {}
}
