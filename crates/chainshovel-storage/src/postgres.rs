//! PostgreSQL storage backend for ChainShovel.
//!
//! Reads persisted sources and integrations, and executes schema DDL.
//!
//! # Feature Flag
//! Requires the `postgres` feature:
//! ```toml
//! chainshovel-storage = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Usage
//! ```rust,no_run
//! use chainshovel_storage::postgres::PostgresStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::connect("postgresql://localhost/chainshovel").await?;
//! store.init_schema().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//! - `chainshovel.sources` — `(name, chain_id, url)` rows added at runtime
//! - `chainshovel.integrations` — one `conf jsonb` blob per integration

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use chainshovel_core::error::ConfigError;
use chainshovel_core::merge::ConfigStore;
use chainshovel_core::table::SchemaExecutor;
use chainshovel_core::{Integration, Source};

// ─── Connection options ────────────────────────────────────────────────────────

/// Connection options for the Postgres backend.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    /// Maximum number of connections in the pool (default: 4)
    pub max_connections: u32,
    /// Connection timeout in seconds (default: 30)
    pub connect_timeout_secs: u64,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            max_connections: 4,
            connect_timeout_secs: 30,
        }
    }
}

// ─── PostgresStore ────────────────────────────────────────────────────────────

/// PostgreSQL-backed config store and schema executor.
///
/// Cheaply cloneable; wraps a connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to a PostgreSQL database.
    ///
    /// The URL follows libpq convention:
    /// `postgresql://[user[:password]@][host][:port][/dbname]`
    pub async fn connect(database_url: &str) -> Result<Self, ConfigError> {
        Self::connect_with_options(database_url, PostgresOptions::default()).await
    }

    /// Connect with custom pool options.
    pub async fn connect_with_options(
        database_url: &str,
        opts: PostgresOptions,
    ) -> Result<Self, ConfigError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(opts.connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| storage("connecting", e))?;
        info!("PostgresStore connected");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the config relations if they don't already exist.
    pub async fn init_schema(&self) -> Result<(), ConfigError> {
        for stmt in [
            "create schema if not exists chainshovel",
            "create table if not exists chainshovel.sources (
                name     text    not null,
                chain_id numeric not null,
                url      text    not null,
                unique (name, chain_id)
            )",
            "create table if not exists chainshovel.integrations (
                name text  not null,
                conf jsonb not null,
                unique (name)
            )",
        ] {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| storage("initializing schema", e))?;
        }
        debug!("PostgresStore schema initialized");
        Ok(())
    }

    /// Upsert an integration's JSON blob by name.
    pub async fn save_integration(&self, ig: &Integration) -> Result<(), ConfigError> {
        let conf = serde_json::to_value(ig).map_err(|source| ConfigError::Decode {
            context: format!("integration {}", ig.name),
            source,
        })?;
        sqlx::query(
            "insert into chainshovel.integrations (name, conf) values ($1, $2)
             on conflict (name) do update set conf = excluded.conf",
        )
        .bind(&ig.name)
        .bind(conf)
        .execute(&self.pool)
        .await
        .map_err(|e| storage("saving integration", e))?;
        Ok(())
    }

    /// Insert a source row; existing (name, chain_id) pairs are left alone.
    pub async fn save_source(&self, src: &Source) -> Result<(), ConfigError> {
        sqlx::query(
            "insert into chainshovel.sources (name, chain_id, url) values ($1, $2::numeric, $3)
             on conflict (name, chain_id) do nothing",
        )
        .bind(&src.name)
        // chain ids span all of u64; numeric round-trips them as text
        .bind(src.chain_id.to_string())
        .bind(src.url.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| storage("saving source", e))?;
        Ok(())
    }

    /// Get the underlying connection pool (for custom queries).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_chain_id(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Storage {
        op: "scanning source",
        reason: format!("source {name}: chain_id {raw:?} is not a u64"),
    })
}

fn decode_integration(name: &str, conf: serde_json::Value) -> Result<Integration, ConfigError> {
    serde_json::from_value(conf).map_err(|source| ConfigError::Decode {
        context: format!("integration {name}"),
        source,
    })
}

fn storage(op: &'static str, e: sqlx::Error) -> ConfigError {
    ConfigError::Storage {
        op,
        reason: e.to_string(),
    }
}

// ─── ConfigStore impl ─────────────────────────────────────────────────────────

#[async_trait]
impl ConfigStore for PostgresStore {
    async fn sources(&self) -> Result<Vec<Source>, ConfigError> {
        let rows = sqlx::query("select name, chain_id::text as chain_id, url from chainshovel.sources")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("querying sources", e))?;

        rows.iter()
            .map(|r| {
                let name: String = r.try_get("name").map_err(|e| storage("scanning source", e))?;
                let chain_id: String = r
                    .try_get("chain_id")
                    .map_err(|e| storage("scanning source", e))?;
                let chain_id = parse_chain_id(&name, &chain_id)?;
                let url: String = r.try_get("url").map_err(|e| storage("scanning source", e))?;
                Ok(Source::new(name, chain_id, url))
            })
            .collect()
    }

    async fn integrations(&self) -> Result<Vec<Integration>, ConfigError> {
        let rows = sqlx::query("select name, conf from chainshovel.integrations")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("querying integrations", e))?;

        rows.iter()
            .map(|r| {
                let name: String = r
                    .try_get("name")
                    .map_err(|e| storage("scanning integration", e))?;
                let conf: serde_json::Value = r
                    .try_get("conf")
                    .map_err(|e| storage("scanning integration", e))?;
                decode_integration(&name, conf)
            })
            .collect()
    }
}

// ─── SchemaExecutor impl ──────────────────────────────────────────────────────

#[async_trait]
impl SchemaExecutor for PostgresStore {
    async fn execute(&self, stmt: &str) -> Result<(), ConfigError> {
        sqlx::query(stmt)
            .execute(&self.pool)
            .await
            .map_err(|e| ConfigError::Execute {
                stmt: stmt.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
