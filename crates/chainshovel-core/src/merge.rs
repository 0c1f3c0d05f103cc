//! Reconciles declared config with config persisted in the database.
//!
//! Both merges are last-write-wins over whole records: persisted rows seed
//! the map, declared records overwrite them. Nothing is written back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Integration, Root, Source};
use crate::error::ConfigError;

/// Read access to persisted sources and integrations.
///
/// Implementations: `InMemoryStore` and `PostgresStore` in
/// `chainshovel-storage`.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Persisted sources. Only `name`, `chain_id` and `url` are populated.
    async fn sources(&self) -> Result<Vec<Source>, ConfigError>;

    /// Persisted integrations, decoded from their JSON blobs.
    async fn integrations(&self) -> Result<Vec<Integration>, ConfigError>;
}

impl Root {
    /// Effective integrations grouped by the name of each source they read.
    ///
    /// An integration with several sources appears under each of them.
    /// Lists are ordered by integration name.
    pub async fn integrations_by_source(
        &self,
        store: &dyn ConfigStore,
    ) -> Result<BTreeMap<String, Vec<Integration>>, ConfigError> {
        let indb = store.integrations().await?;

        let mut uniq: BTreeMap<String, Integration> = BTreeMap::new();
        for ig in indb {
            uniq.insert(ig.name.clone(), ig);
        }
        for ig in &self.integrations {
            uniq.insert(ig.name.clone(), ig.clone());
        }
        info!(integrations = uniq.len(), "merged integrations");

        let mut res: BTreeMap<String, Vec<Integration>> = BTreeMap::new();
        for ig in uniq.into_values() {
            for src in &ig.sources {
                res.entry(src.name.clone()).or_default().push(ig.clone());
            }
        }
        Ok(res)
    }

    /// Effective sources, one per chain id, ascending by chain id.
    pub async fn all_sources(&self, store: &dyn ConfigStore) -> Result<Vec<Source>, ConfigError> {
        let indb = store.sources().await?;

        let mut uniq: BTreeMap<u64, Source> = BTreeMap::new();
        for src in indb {
            uniq.insert(src.chain_id, src);
        }
        for src in &self.sources {
            uniq.insert(src.chain_id, src.clone());
        }
        info!(sources = uniq.len(), "merged sources");
        Ok(uniq.into_values().collect())
    }
}
