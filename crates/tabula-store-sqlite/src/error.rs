use std::fmt;
use std::path::PathBuf;

use tabula_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no store exists at {}", .0.display())]
    NotFound(PathBuf),
    #[error("a value for '{0}' does not seem to be set in table 'self'")]
    MetaKeyMissing(String),
    #[error("cannot write a store to {}: {reason}", .path.display())]
    NotWritable { path: PathBuf, reason: String },
    #[error("{} does not seem to be a database generated by tabula", .0.display())]
    NotRecognized(PathBuf),
    #[error("the version recorded in {} is not an integer: {version:?}", .path.display())]
    MalformedVersion { path: PathBuf, version: String },
    #[error(
        "the database at {} was generated by a newer version (v{stored}) than this client \
         understands (v{expected}); the client needs an upgrade",
        .path.display()
    )]
    VersionNewer { path: PathBuf, stored: i64, expected: i64 },
    #[error(
        "the database at {} is outdated (its version is v{stored}, but this client only knows \
         how to deal with v{expected}); migrate it with the store migration tool first",
        .path.display()
    )]
    VersionOlder { path: PathBuf, stored: i64, expected: i64 },
    #[error("create_table: '{table}' declares {columns} columns but {types} types; the two have to match")]
    SchemaMismatch { table: String, columns: usize, types: usize },
    #[error("structure for '{table}' names {expected} columns but a row holds {found} values")]
    StructureMismatch { table: String, expected: usize, found: usize },
    #[error("rows for '{table}' must all hold {expected} values; row {row} holds {found}")]
    ArityMismatch { table: String, expected: usize, found: usize, row: usize },
    #[error(
        "table '{table}' is corrupt: it holds {rows} rows but only {unique_keys} unique keys, so \
         some rows would be overwritten in a keyed view"
    )]
    IntegrityViolation { table: String, rows: usize, unique_keys: usize },
    #[error(
        "nothing left to return from '{table}' after removing the columns that were not of interest"
    )]
    EmptyProjection { table: String },
    #[error("query on '{table}' with the predicate '{predicate}' did not return anything")]
    EmptyResult { table: String, predicate: String },
    #[error("no table named '{0}' in this store")]
    UnknownTable(String),
    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("table '{0}' is reserved for store metadata")]
    ReservedTable(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("SQLite error: {0}")]
    Engine(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig(reason) => Self::InvalidConfig(reason),
            CoreError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            CoreError::UnknownColumn { table, column } => Self::UnknownColumn { table, column },
            CoreError::EmptyProjection { table } => Self::EmptyProjection { table },
            CoreError::IntegrityViolation { table, rows, unique_keys } => {
                Self::IntegrityViolation { table, rows, unique_keys }
            }
            CoreError::StructureMismatch { table, expected, found } => {
                Self::StructureMismatch { table, expected, found }
            }
        }
    }
}

/// Flat classification of [`StoreError`] for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotWritable,
    Format,
    VersionNewer,
    VersionOlder,
    SchemaMismatch,
    IntegrityViolation,
    EmptyProjection,
    EmptyResult,
    InvalidInput,
    Engine,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::NotWritable => write!(f, "not_writable"),
            Self::Format => write!(f, "format"),
            Self::VersionNewer => write!(f, "version_newer"),
            Self::VersionOlder => write!(f, "version_older"),
            Self::SchemaMismatch => write!(f, "schema_mismatch"),
            Self::IntegrityViolation => write!(f, "integrity_violation"),
            Self::EmptyProjection => write!(f, "empty_projection"),
            Self::EmptyResult => write!(f, "empty_result"),
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::Engine => write!(f, "engine"),
            Self::Io => write!(f, "io"),
        }
    }
}

impl StoreError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::MetaKeyMissing(_) | Self::UnknownTable(_) => {
                ErrorKind::NotFound
            }
            Self::NotWritable { .. } => ErrorKind::NotWritable,
            Self::NotRecognized(_) | Self::MalformedVersion { .. } => ErrorKind::Format,
            Self::VersionNewer { .. } => ErrorKind::VersionNewer,
            Self::VersionOlder { .. } => ErrorKind::VersionOlder,
            Self::SchemaMismatch { .. } | Self::StructureMismatch { .. } => {
                ErrorKind::SchemaMismatch
            }
            Self::IntegrityViolation { .. } => ErrorKind::IntegrityViolation,
            Self::EmptyProjection { .. } => ErrorKind::EmptyProjection,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::ArityMismatch { .. }
            | Self::UnknownColumn { .. }
            | Self::InvalidIdentifier(_)
            | Self::ReservedTable(_)
            | Self::InvalidConfig(_) => ErrorKind::InvalidInput,
            Self::Engine(_) => ErrorKind::Engine,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
