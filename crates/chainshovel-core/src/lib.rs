//! chainshovel-core — config reconciliation and schema derivation for the
//! event-to-table indexer.
//!
//! # Pipeline
//!
//! ```text
//! Root (declared JSON)
//!   └── validate_fix
//!         ├── check_user_input     (identifier safety)
//!         ├── add_required_fields  (bookkeeping columns + block fields)
//!         ├── add_unique_index     (default unique group)
//!         └── validate_col_refs    (duplicates, dangling references)
//!
//! plan::ddl / plan::migrate       (tables → idempotent DDL)
//! Root::integrations_by_source    (declared ⊕ persisted, by name)
//! Root::all_sources               (declared ⊕ persisted, by chain id)
//! ```

pub mod config;
pub mod derive;
pub mod error;
pub mod event;
pub mod merge;
pub mod plan;
pub mod safety;
pub mod table;
pub mod validate;

pub use config::{Compiled, Dashboard, EnvString, Integration, Root, Source};
pub use derive::add_unique_index;
pub use error::{ConfigError, DuplicateKind};
pub use event::{BlockData, Event, EventSelection, Input};
pub use merge::ConfigStore;
pub use plan::{ddl, migrate};
pub use safety::{check_ident, check_safe, check_user_input};
pub use table::{union, Column, SchemaExecutor, Table};
pub use validate::{validate_col_refs, validate_fix};
