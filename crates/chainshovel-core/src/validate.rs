//! Reference validation and the one-shot `validate_fix` pass.

use std::collections::HashSet;

use tracing::info;

use crate::config::{Integration, Root};
use crate::derive::add_unique_index;
use crate::error::{ConfigError, DuplicateKind};
use crate::event::EventSelection;
use crate::safety::check_user_input;

fn check_unique<'a>(
    kind: DuplicateKind,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that names are unique and every selected input and block field
/// points at an existing column. Fails on the first problem found:
/// duplicates, then selected inputs, then block fields.
pub fn validate_col_refs(ig: &Integration) -> Result<(), ConfigError> {
    check_unique(
        DuplicateKind::Column,
        ig.table.columns.iter().map(|c| c.name.as_str()),
    )?;
    check_unique(
        DuplicateKind::Input,
        ig.event.inputs().iter().map(|i| i.name.as_str()),
    )?;
    check_unique(
        DuplicateKind::BlockData,
        ig.block.iter().map(|b| b.name.as_str()),
    )?;

    for inp in ig.event.selected() {
        let found = inp.column().is_some_and(|c| ig.table.has_column(c));
        if !found {
            return Err(ConfigError::MissingColumn {
                field: inp.name.clone(),
            });
        }
    }

    for bd in &ig.block {
        if bd.column.is_empty() || !ig.table.has_column(&bd.column) {
            return Err(ConfigError::MissingColumn {
                field: format!("block.{}", bd.name),
            });
        }
    }
    Ok(())
}

/// Validate a freshly loaded config and fill in derived schema.
///
/// Rejects unsafe strings, then for each integration injects the
/// bookkeeping fields, infers the default unique index, and checks column
/// references. The first failure aborts the whole pass.
pub fn validate_fix(conf: &mut Root) -> Result<(), ConfigError> {
    check_user_input(conf)?;
    for ig in conf.integrations.iter_mut() {
        ig.add_required_fields();
        add_unique_index(&mut ig.table);
        validate_col_refs(ig).map_err(|e| e.in_integration(&ig.name))?;
    }
    info!(
        integrations = conf.integrations.len(),
        sources = conf.sources.len(),
        "config validated"
    );
    Ok(())
}
