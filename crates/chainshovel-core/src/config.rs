//! Declared configuration: sources, integrations, and the root document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::{BlockData, Event};
use crate::table::Table;

// ─── EnvString ────────────────────────────────────────────────────────────────

/// A string that may name an environment variable (`"$PG_URL"`).
///
/// Stored and serialized as written; call [`EnvString::resolve`] to read the
/// variable. Unset variables resolve to the literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvString(pub String);

impl EnvString {
    pub fn resolve(&self) -> String {
        match self.0.strip_prefix('$') {
            Some(var) if !var.is_empty() => std::env::var(var).unwrap_or_else(|_| self.0.clone()),
            _ => self.0.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EnvString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EnvString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub enable_loopback_authn: bool,
    #[serde(default)]
    pub disable_authn: bool,
    #[serde(default)]
    pub root_password: EnvString,
}

// ─── Source ───────────────────────────────────────────────────────────────────

/// A named upstream chain feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default)]
    pub url: EnvString,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub stop: u64,
    #[serde(default)]
    pub concurrency: u32,
    #[serde(default)]
    pub batch_size: u32,
}

impl Source {
    pub fn new(name: impl Into<String>, chain_id: u64, url: impl Into<EnvString>) -> Self {
        Self {
            name: name.into(),
            chain_id,
            url: url.into(),
            ..Default::default()
        }
    }
}

// ─── Integration ──────────────────────────────────────────────────────────────

/// Compiled form of an integration, opaque to this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compiled {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// A named mapping from an event/block stream to a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub table: Table,
    #[serde(default)]
    pub compiled: Compiled,
    #[serde(default)]
    pub block: Vec<BlockData>,
    #[serde(default)]
    pub event: Event,
}

impl Integration {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            table,
            ..Default::default()
        }
    }

    /// Look up one of this integration's sources by name.
    pub fn source(&self, name: &str) -> Result<&Source, ConfigError> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::MissingSource {
                name: name.to_string(),
            })
    }

    /// Decode a persisted JSON blob.
    pub fn from_json(buf: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(buf).map_err(|source| ConfigError::Decode {
            context: "integration".into(),
            source,
        })
    }
}

// ─── Root ─────────────────────────────────────────────────────────────────────

/// The declared configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Root {
    #[serde(default)]
    pub dashboard: Dashboard,
    #[serde(default)]
    pub pg_url: EnvString,
    #[serde(rename = "eth_sources", default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub integrations: Vec<Integration>,
}

impl Root {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|source| ConfigError::Decode {
            context: "config".into(),
            source,
        })
    }

    /// Read and parse a JSON config file. Does not validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_string_literal_and_missing_var() {
        assert_eq!(EnvString::from("https://rpc").resolve(), "https://rpc");
        let missing = EnvString::from("$CHAINSHOVEL_TEST_SURELY_UNSET_VAR");
        assert_eq!(missing.resolve(), "$CHAINSHOVEL_TEST_SURELY_UNSET_VAR");
        assert_eq!(EnvString::from("$").resolve(), "$");
    }

    #[test]
    fn env_string_reads_var() {
        std::env::set_var("CHAINSHOVEL_TEST_RPC_URL", "https://eth.example");
        assert_eq!(
            EnvString::from("$CHAINSHOVEL_TEST_RPC_URL").resolve(),
            "https://eth.example"
        );
    }

    #[test]
    fn root_uses_eth_sources_key() {
        let root = Root::from_json(
            r#"{"pg_url":"$DATABASE_URL","eth_sources":[{"name":"mainnet","chain_id":1,"url":"x"}]}"#,
        )
        .unwrap();
        assert_eq!(root.sources.len(), 1);
        assert_eq!(root.sources[0].chain_id, 1);
        assert_eq!(root.pg_url.as_str(), "$DATABASE_URL");
        assert!(root.integrations.is_empty());
    }

    #[test]
    fn integration_source_lookup() {
        let mut ig = Integration::new("x", Table::new("t"));
        ig.sources.push(Source::new("mainnet", 1, "u"));
        assert_eq!(ig.source("mainnet").unwrap().chain_id, 1);
        let err = ig.source("base").unwrap_err();
        assert_eq!(err.to_string(), "missing source config for: base");
    }

    #[test]
    fn integration_from_bad_json() {
        let err = Integration::from_json(b"{not json").unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("decoding integration"));
    }

    #[test]
    fn compiled_config_is_opaque() {
        let ig = Integration::from_json(
            br#"{"name":"a","compiled":{"name":"js","config":{"anything":[1,2]}}}"#,
        )
        .unwrap();
        assert_eq!(ig.compiled.config["anything"][1], 2);
        assert!(!ig.enabled);
    }
}
