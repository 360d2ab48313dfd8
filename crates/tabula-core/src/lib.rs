//! Engine-independent building blocks for tabula stores: cell values and their coercion,
//! handle configuration, identifier rules, predicates, projection shaping and event
//! reporting.

pub mod config;
pub mod ident;
pub mod predicate;
pub mod report;
pub mod value;
pub mod view;

pub use config::{OpenMode, StoreConfig, DEFAULT_PARENT_COLUMN};
pub use ident::{quote, validate_identifier, validate_type_decl};
pub use predicate::{CompareOp, CompiledPredicate, Predicate};
pub use report::{Reporter, SilentReporter, StoreEvent, TracingReporter};
pub use value::{coerce, coerce_text, Coercion, RawCell, Value};
pub use view::{check_unique_keys, Entry, Frame, ResolvedView, TableDict, ViewSpec};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },
    #[error(
        "nothing left to return from '{table}' after removing the columns that were not of interest"
    )]
    EmptyProjection { table: String },
    #[error(
        "table '{table}' is corrupt: it holds {rows} rows but only {unique_keys} unique keys, so \
         some rows would be overwritten in a keyed view"
    )]
    IntegrityViolation { table: String, rows: usize, unique_keys: usize },
    #[error("structure for '{table}' names {expected} columns but a row holds {found} values")]
    StructureMismatch { table: String, expected: usize, found: usize },
}
