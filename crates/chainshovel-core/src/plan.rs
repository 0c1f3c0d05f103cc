//! Schema planning across integrations.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::Root;
use crate::error::ConfigError;
use crate::table::{union, SchemaExecutor, Table};

/// Merge tables that share a name into one table per name.
///
/// Integrations fold in declared order and the last definition wins: each
/// newly seen table is the base, and the tables merged so far only
/// contribute columns it lacks. Column types and unique groups therefore
/// come from the last integration declaring that name.
pub fn merged_tables(conf: &Root) -> BTreeMap<String, Table> {
    let mut tables: BTreeMap<String, Table> = BTreeMap::new();
    for ig in &conf.integrations {
        let next = match tables.remove(&ig.table.name) {
            Some(existing) => union(ig.table.clone(), &existing),
            None => ig.table.clone(),
        };
        tables.insert(next.name.clone(), next);
    }
    tables
}

/// DDL for every table in `conf`, one merged table per name, in table-name
/// order.
pub fn ddl(conf: &Root) -> Vec<String> {
    merged_tables(conf)
        .values()
        .flat_map(|t| t.ddl())
        .collect()
}

/// Migrate each integration's own table in declared order.
///
/// Tables are not merged here; overlapping definitions rely on the DDL
/// being idempotent.
pub async fn migrate(exec: &dyn SchemaExecutor, conf: &Root) -> Result<(), ConfigError> {
    for ig in &conf.integrations {
        ig.table
            .migrate(exec)
            .await
            .map_err(|e| ConfigError::Migration {
                integration: ig.name.clone(),
                source: Box::new(e),
            })?;
        info!(integration = %ig.name, table = %ig.table.name, "migrated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Integration;
    use crate::validate::validate_fix;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn root() -> Root {
        Root {
            integrations: vec![
                Integration::new("A", Table::new("prices").column("x", "numeric")),
                Integration::new("B", Table::new("prices").column("y", "numeric")),
                Integration::new("C", Table::new("approvals").column("z", "bytea")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn shared_table_is_merged_once() {
        let mut conf = root();
        validate_fix(&mut conf).unwrap();
        let stmts = ddl(&conf);

        let creates: Vec<_> = stmts.iter().filter(|s| s.starts_with("create table")).collect();
        assert_eq!(creates.len(), 2);
        // approvals sorts before prices
        assert!(creates[0].starts_with("create table if not exists approvals("));
        assert!(creates[1].starts_with("create table if not exists prices("));
        assert!(creates[1].contains("x numeric"));
        assert!(creates[1].contains("y numeric"));
        assert!(stmts.contains(&"alter table prices add column if not exists y numeric".to_string()));
    }

    #[test]
    fn ddl_is_deterministic() {
        let mut conf = root();
        validate_fix(&mut conf).unwrap();
        assert_eq!(ddl(&conf), ddl(&conf));
    }

    #[test]
    fn merged_tables_last_declared_is_base() {
        let conf = root();
        let tables = merged_tables(&conf);
        let prices = &tables["prices"];
        let names: Vec<_> = prices.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["y", "x"]);
    }

    #[test]
    fn shared_table_takes_types_and_unique_from_last_declaration() {
        let mut a = Table::new("prices").column("x", "numeric");
        a.unique.push(vec!["x".into()]);
        let mut b = Table::new("prices").column("x", "text").column("y", "int");
        b.unique.push(vec!["y".into()]);
        let conf = Root {
            integrations: vec![Integration::new("A", a), Integration::new("B", b)],
            ..Default::default()
        };

        let prices = &merged_tables(&conf)["prices"];
        assert_eq!(prices.get_column("x").unwrap().ty, "text");
        assert_eq!(prices.columns.len(), 2);
        assert_eq!(prices.unique, vec![vec!["y"]]);
    }

    #[test]
    fn three_way_merge_keeps_every_column() {
        let conf = Root {
            integrations: vec![
                Integration::new("A", Table::new("p").column("a", "int")),
                Integration::new("B", Table::new("p").column("b", "int")),
                Integration::new("C", Table::new("p").column("c", "int")),
            ],
            ..Default::default()
        };
        let names: Vec<_> = merged_tables(&conf)["p"]
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn empty_root_has_no_ddl() {
        assert!(ddl(&Root::default()).is_empty());
    }

    struct FailTable {
        table: &'static str,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SchemaExecutor for FailTable {
        async fn execute(&self, stmt: &str) -> Result<(), ConfigError> {
            self.seen.lock().unwrap().push(stmt.to_string());
            if stmt.contains(&format!(" {}(", self.table)) {
                return Err(ConfigError::Execute {
                    stmt: stmt.to_string(),
                    reason: "permission denied".into(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn migrate_is_per_integration_and_names_failure() {
        let conf = root();
        let exec = FailTable {
            table: "approvals",
            seen: Mutex::new(vec![]),
        };
        let err = migrate(&exec, &conf).await.unwrap_err();
        assert!(err.to_string().starts_with("migrating integration: C: "));

        let seen = exec.seen.lock().unwrap();
        // A and B each migrated their own prices table
        let creates = seen
            .iter()
            .filter(|s| s.starts_with("create table if not exists prices("))
            .count();
        assert_eq!(creates, 2);
        assert!(seen.last().unwrap().contains("approvals"));
    }

    #[tokio::test]
    async fn migrate_ok() {
        let conf = root();
        let exec = FailTable {
            table: "nothing_matches",
            seen: Mutex::new(vec![]),
        };
        migrate(&exec, &conf).await.unwrap();
        let expected: usize = conf.integrations.iter().map(|ig| ig.table.ddl().len()).sum();
        assert_eq!(exec.seen.lock().unwrap().len(), expected);
    }
}
