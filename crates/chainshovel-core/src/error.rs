//! Error types for config validation, merging, and migration.

use std::fmt;

use thiserror::Error;

/// Which name set a duplicate was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    Column,
    Input,
    BlockData,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DuplicateKind::Column => "column",
            DuplicateKind::Input => "input",
            DuplicateKind::BlockData => "block data field",
        };
        write!(f, "{s}")
    }
}

/// Errors raised while validating, merging, or migrating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsafe {field} {value:?}: disallowed character {ch:?}")]
    Unsafe {
        field: &'static str,
        value: String,
        ch: char,
    },

    #[error("empty {field}")]
    Empty { field: &'static str },

    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: DuplicateKind, name: String },

    /// A selected input or block field has no backing column.
    /// Block fields are reported as `block.<name>`.
    #[error("missing column for {field}")]
    MissingColumn { field: String },

    #[error("missing source config for: {name}")]
    MissingSource { name: String },

    #[error("integration '{name}': {source}")]
    Integration {
        name: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("storage error ({op}): {reason}")]
    Storage { op: &'static str, reason: String },

    #[error("decoding {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("migrating integration: {integration}: {source}")]
    Migration {
        integration: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("executing {stmt:?}: {reason}")]
    Execute { stmt: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Returns `true` for errors caused by the configuration itself
    /// (unsafe strings, duplicates, dangling column references).
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Unsafe { .. }
            | Self::Empty { .. }
            | Self::Duplicate { .. }
            | Self::MissingColumn { .. }
            | Self::MissingSource { .. } => true,
            Self::Integration { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// Returns `true` if the error came from the persistence layer.
    /// The caller decides whether such errors are worth retrying.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Decode { .. })
    }

    pub(crate) fn in_integration(self, name: &str) -> Self {
        Self::Integration {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_field_message_names_field() {
        let e = ConfigError::MissingColumn {
            field: "block.tx_hash".into(),
        };
        assert_eq!(e.to_string(), "missing column for block.tx_hash");
    }

    #[test]
    fn wrapped_validation_is_still_validation() {
        let e = ConfigError::Duplicate {
            kind: DuplicateKind::Input,
            name: "from".into(),
        }
        .in_integration("transfers");
        assert!(e.is_validation());
        assert_eq!(e.to_string(), "integration 'transfers': duplicate input: from");
    }

    #[test]
    fn storage_errors_classified() {
        let e = ConfigError::Storage {
            op: "querying sources",
            reason: "connection reset".into(),
        };
        assert!(e.is_storage());
        assert!(!e.is_validation());
    }
}
