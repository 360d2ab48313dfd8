//! Row filters for the predicate-taking fetch operations.
//!
//! `Raw` passes an engine-native boolean expression through untouched; the caller owns
//! its correctness and safety. The structured forms are compiled with bound parameters
//! after every column they name is checked against the target table.

use serde::{Deserialize, Serialize};

use crate::ident::quote;
use crate::{CoreError, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Raw(String),
    Compare { column: String, op: CompareOp, value: Value },
    IsNull(String),
    NotNull(String),
    In { column: String, values: Vec<Value> },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

/// SQL text for a `WHERE` clause plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Predicate {
    pub fn raw(expression: impl Into<String>) -> Self {
        Self::Raw(expression.into())
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare { column: column.into(), op: CompareOp::Eq, value: value.into() }
    }

    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare { column: column.into(), op, value: value.into() }
    }

    /// Compile against the column list of `table`.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownColumn`] when a structured predicate names a column the
    /// table does not have.
    pub fn compile(&self, table: &str, columns: &[String]) -> Result<CompiledPredicate, CoreError> {
        let mut params = Vec::new();
        let sql = self.compile_into(table, columns, &mut params)?;
        Ok(CompiledPredicate { sql, params })
    }

    fn compile_into(
        &self,
        table: &str,
        columns: &[String],
        params: &mut Vec<Value>,
    ) -> Result<String, CoreError> {
        let column_sql = |column: &str| -> Result<String, CoreError> {
            if columns.iter().any(|known| known == column) {
                Ok(quote(column))
            } else {
                Err(CoreError::UnknownColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                })
            }
        };

        match self {
            Self::Raw(expression) => Ok(expression.clone()),
            Self::Compare { column, op, value } => {
                let column = column_sql(column)?;
                params.push(value.clone());
                Ok(format!("{column} {} ?", op.as_sql()))
            }
            Self::IsNull(column) => Ok(format!("{} IS NULL", column_sql(column)?)),
            Self::NotNull(column) => Ok(format!("{} IS NOT NULL", column_sql(column)?)),
            Self::In { column, values } => {
                let column = column_sql(column)?;
                if values.is_empty() {
                    return Ok("0".to_string());
                }
                params.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                Ok(format!("{column} IN ({placeholders})"))
            }
            Self::And(parts) => Self::join(parts, " AND ", "1", table, columns, params),
            Self::Or(parts) => Self::join(parts, " OR ", "0", table, columns, params),
        }
    }

    fn join(
        parts: &[Predicate],
        separator: &str,
        empty: &str,
        table: &str,
        columns: &[String],
        params: &mut Vec<Value>,
    ) -> Result<String, CoreError> {
        if parts.is_empty() {
            return Ok(empty.to_string());
        }
        let compiled = parts
            .iter()
            .map(|part| part.compile_into(table, columns, params).map(|sql| format!("({sql})")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(compiled.join(separator))
    }
}

impl From<&str> for Predicate {
    fn from(expression: &str) -> Self {
        Self::Raw(expression.to_string())
    }
}

impl From<String> for Predicate {
    fn from(expression: String) -> Self {
        Self::Raw(expression)
    }
}
