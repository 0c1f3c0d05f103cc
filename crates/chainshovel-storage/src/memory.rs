//! In-memory storage backend.
//!
//! Holds persisted sources and integration blobs in RAM and records every
//! DDL statement it is asked to execute. Integrations are kept as raw JSON
//! and decoded on read, the same way the Postgres backend does it.

use async_trait::async_trait;
use std::sync::Mutex;

use chainshovel_core::error::ConfigError;
use chainshovel_core::merge::ConfigStore;
use chainshovel_core::table::SchemaExecutor;
use chainshovel_core::{Integration, Source};

/// In-memory config store and recording schema executor.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStore {
    sources: Mutex<Vec<Source>>,
    integrations: Mutex<Vec<Vec<u8>>>,
    executed: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a source row. Only name, chain id and url are kept, matching
    /// what the sources relation stores.
    pub fn insert_source(&self, src: &Source) {
        self.sources
            .lock()
            .unwrap()
            .push(Source::new(src.name.clone(), src.chain_id, src.url.clone()));
    }

    /// Persist an integration as its JSON blob.
    pub fn insert_integration(&self, ig: &Integration) -> Result<(), ConfigError> {
        let blob = serde_json::to_vec(ig).map_err(|source| ConfigError::Decode {
            context: format!("integration {}", ig.name),
            source,
        })?;
        self.integrations.lock().unwrap().push(blob);
        Ok(())
    }

    /// Persist a raw blob as-is (may be invalid JSON).
    pub fn insert_raw_integration(&self, blob: impl Into<Vec<u8>>) {
        self.integrations.lock().unwrap().push(blob.into());
    }

    /// Statements passed to [`SchemaExecutor::execute`], in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigStore for InMemoryStore {
    async fn sources(&self) -> Result<Vec<Source>, ConfigError> {
        Ok(self.sources.lock().unwrap().clone())
    }

    async fn integrations(&self) -> Result<Vec<Integration>, ConfigError> {
        let blobs = self.integrations.lock().unwrap().clone();
        blobs
            .iter()
            .enumerate()
            .map(|(i, b)| {
                serde_json::from_slice(b).map_err(|source| ConfigError::Decode {
                    context: format!("integration row {i}"),
                    source,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SchemaExecutor for InMemoryStore {
    async fn execute(&self, stmt: &str) -> Result<(), ConfigError> {
        self.executed.lock().unwrap().push(stmt.to_string());
        Ok(())
    }
}
