//! Identifier rules for names that end up interpolated into statements.
//!
//! Table and column names cannot be bound as parameters, so every name is checked here
//! before it is quoted into SQL. Values never go through this path.

use crate::CoreError;

/// Validate a table or column name: ASCII letter or `_` first, then ASCII alphanumerics
/// or `_`.
///
/// # Errors
/// Returns [`CoreError::InvalidIdentifier`] when the name breaks the rule.
pub fn validate_identifier(name: &str) -> Result<(), CoreError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(CoreError::InvalidIdentifier(name.to_string()));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(CoreError::InvalidIdentifier(name.to_string()));
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(CoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Validate a declared column type such as `integer`, `TEXT` or `NUMERIC(10, 5)`.
///
/// # Errors
/// Returns [`CoreError::InvalidIdentifier`] when the declaration is empty or contains
/// characters outside the accepted set.
pub fn validate_type_decl(decl: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::InvalidIdentifier(decl.to_string());
    let trimmed = decl.trim();
    let (base, args) = match trimmed.split_once('(') {
        Some((base, rest)) => (base, Some(rest.strip_suffix(')').ok_or_else(invalid)?)),
        None => (trimmed, None),
    };

    let base = base.trim_end();
    if base.is_empty() || !base.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_'))
    {
        return Err(invalid());
    }
    // Precision arguments: digits separated by commas.
    if let Some(args) = args {
        if !args.split(',').all(|arg| {
            let arg = arg.trim();
            !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit())
        }) {
            return Err(invalid());
        }
    }
    Ok(())
}

/// Double-quote an identifier that has already passed validation.
#[must_use]
pub fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
