//! chainshovel-storage — backends for persisted ChainShovel config.
//!
//! Backends:
//! - [`memory`] — in-memory (dev/testing, no persistence)
//! - `postgres` — PostgreSQL via `sqlx` (feature `postgres`)

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
