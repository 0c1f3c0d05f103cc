//! Bookkeeping columns and the default unique index.
//!
//! Every row needs an identity independent of what the user selected:
//! which integration and source wrote it, and where in the chain it came
//! from. These columns back upserts and reorg rollback downstream.

use tracing::debug;

use crate::config::Integration;
use crate::event::{BlockData, EventSelection};
use crate::table::{Column, Table};

/// Candidate columns for the default unique group, in priority order.
pub const UNIQUE_CANDIDATES: [&str; 6] = [
    "ig_name",
    "src_name",
    "block_num",
    "tx_idx",
    "log_idx",
    "abi_idx",
];

impl Integration {
    /// Inject the bookkeeping block fields and columns this integration
    /// needs. Existing entries with the same name are left alone, so
    /// running this twice is a no-op.
    pub fn add_required_fields(&mut self) {
        self.add_required("ig_name", "text");
        self.add_required("src_name", "text");
        self.add_required("block_num", "numeric");
        self.add_required("tx_idx", "int");
        if !self.event.selected().is_empty() {
            self.add_required("log_idx", "int");
        }
        // abi_idx disambiguates log-body decodes across ABI signatures
        if self.event.selects_unindexed() {
            self.add_required("abi_idx", "int2");
        }
    }

    fn add_required(&mut self, name: &str, ty: &str) {
        if !self.block.iter().any(|bd| bd.name == name) {
            self.block.push(BlockData::new(name, name));
        }
        if !self.table.has_column(name) {
            debug!(integration = %self.name, column = name, ty, "adding required column");
            self.table.columns.push(Column::new(name, ty));
        }
    }
}

/// Give `table` a unique group built from the bookkeeping columns it has,
/// unless the user already declared one.
pub fn add_unique_index(table: &mut Table) {
    if !table.unique.is_empty() {
        return;
    }
    let group: Vec<String> = UNIQUE_CANDIDATES
        .iter()
        .filter(|c| table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if group.is_empty() {
        return;
    }
    debug!(table = %table.name, ?group, "inferred unique index");
    table.unique.push(group);
}
