//! Guards strings that end up spliced into DDL.
//!
//! Identifiers and column types are interpolated into SQL text, so they must
//! stay inside a small character set: ASCII letters, digits, `_`, and the
//! brackets used by array types (`text[]`).

use crate::config::Root;
use crate::error::ConfigError;

fn allowed(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '[' | ']')
}

/// Check a single value. `field` names where it came from in error messages.
pub fn check_safe(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match value.chars().find(|c| !allowed(*c)) {
        Some(ch) => Err(ConfigError::Unsafe {
            field,
            value: value.to_string(),
            ch,
        }),
        None => Ok(()),
    }
}

/// Like [`check_safe`], but also rejects the empty string. Used for values
/// that must name something in DDL.
pub fn check_ident(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Empty { field });
    }
    check_safe(field, value)
}

/// Check every user-supplied identifier in `conf`, stopping at the first
/// unsafe one.
pub fn check_user_input(conf: &Root) -> Result<(), ConfigError> {
    for ig in &conf.integrations {
        check_safe("integration name", &ig.name)?;
        check_ident("table name", &ig.table.name)?;
        for c in &ig.table.columns {
            check_ident("column name", &c.name)?;
            check_ident("column type", &c.ty)?;
        }
    }
    for src in &conf.sources {
        check_safe("source name", &src.name)?;
    }
    Ok(())
}
