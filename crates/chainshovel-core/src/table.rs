//! Table model — columns, unique groups, idempotent DDL, and table union.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

// ─── Column / Table ───────────────────────────────────────────────────────────

/// A single column: name plus SQL type string (e.g. `"numeric"`, `"bytea"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A relational table fragment owned by one integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Unique-constraint column groups.
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder helper: append a column.
    pub fn column(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.columns.push(Column::new(name, ty));
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Idempotent statements that bring a database in line with this table.
    ///
    /// Order: create table, one add-column per column, one unique index per
    /// non-empty group.
    pub fn ddl(&self) -> Vec<String> {
        let cols = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.ty))
            .collect::<Vec<_>>()
            .join(", ");

        let mut res = Vec::with_capacity(1 + self.columns.len() + self.unique.len());
        res.push(format!("create table if not exists {}({})", self.name, cols));
        for c in &self.columns {
            res.push(format!(
                "alter table {} add column if not exists {} {}",
                self.name, c.name, c.ty
            ));
        }
        for (i, group) in self.unique.iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            let idx = if i == 0 {
                format!("u_{}", self.name)
            } else {
                format!("u_{}_{}", self.name, i)
            };
            res.push(format!(
                "create unique index if not exists {} on {} ({})",
                idx,
                self.name,
                group.join(", ")
            ));
        }
        res
    }

    /// Run [`Table::ddl`] against `exec`, stopping on the first failure.
    pub async fn migrate(&self, exec: &dyn SchemaExecutor) -> Result<(), ConfigError> {
        for stmt in self.ddl() {
            debug!(table = %self.name, %stmt, "executing");
            exec.execute(&stmt).await?;
        }
        Ok(())
    }
}

/// Merge `b`'s columns into `a` by name.
///
/// Columns of `b` missing from `a` are appended with `b`'s type. When both
/// declare a column with different types, `a`'s type is kept and a warning
/// is logged; unique groups are taken from `a` unchanged.
pub fn union(mut a: Table, b: &Table) -> Table {
    for col in &b.columns {
        match a.get_column(&col.name) {
            Some(existing) => {
                if existing.ty != col.ty {
                    warn!(
                        table = %a.name,
                        column = %col.name,
                        kept = %existing.ty,
                        dropped = %col.ty,
                        "column type conflict in table union"
                    );
                }
            }
            None => a.columns.push(col.clone()),
        }
    }
    a
}

// ─── SchemaExecutor ───────────────────────────────────────────────────────────

/// Something that can run a single DDL statement (a live connection, a
/// transaction, or a recorder in tests).
#[async_trait]
pub trait SchemaExecutor: Send + Sync {
    async fn execute(&self, stmt: &str) -> Result<(), ConfigError>;
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    fn names(t: &Table) -> BTreeSet<String> {
        t.columns.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn ddl_statement_order() {
        let mut t = Table::new("transfers")
            .column("block_num", "numeric")
            .column("f", "bytea");
        t.unique.push(vec!["block_num".into(), "f".into()]);

        assert_eq!(
            t.ddl(),
            vec![
                "create table if not exists transfers(block_num numeric, f bytea)",
                "alter table transfers add column if not exists block_num numeric",
                "alter table transfers add column if not exists f bytea",
                "create unique index if not exists u_transfers on transfers (block_num, f)",
            ]
        );
    }

    #[test]
    fn ddl_skips_empty_groups_and_numbers_later_ones() {
        let mut t = Table::new("t").column("a", "int");
        t.unique.push(vec![]);
        t.unique.push(vec!["a".into()]);
        let ddl = t.ddl();
        assert_eq!(ddl.len(), 3);
        assert_eq!(ddl[2], "create unique index if not exists u_t_1 on t (a)");
    }

    #[test]
    fn union_adds_missing_columns() {
        let a = Table::new("prices").column("x", "numeric");
        let b = Table::new("prices").column("y", "text");
        let u = union(a, &b);
        assert_eq!(u.columns, vec![Column::new("x", "numeric"), Column::new("y", "text")]);
    }

    #[test]
    fn union_disjoint_is_commutative_as_a_set() {
        let a = Table::new("p").column("x", "int").column("z", "int");
        let b = Table::new("p").column("y", "int");
        let ab = union(a.clone(), &b);
        let ba = union(b, &a);
        assert_eq!(names(&ab), names(&ba));
    }

    #[test]
    fn union_type_conflict_keeps_first() {
        let a = Table::new("p").column("x", "numeric");
        let b = Table::new("p").column("x", "text");
        let u = union(a, &b);
        assert_eq!(u.columns, vec![Column::new("x", "numeric")]);
    }

    #[test]
    fn table_json_shape() {
        let json = r#"{"name":"t","columns":[{"name":"a","type":"int"}],"unique":[["a"]]}"#;
        let t: Table = serde_json::from_str(json).unwrap();
        assert_eq!(t.columns[0].ty, "int");
        assert_eq!(t.unique, vec![vec!["a".to_string()]]);
        assert_eq!(serde_json::to_string(&t).unwrap(), json);
    }

    #[derive(Default)]
    struct FailOn {
        needle: &'static str,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SchemaExecutor for FailOn {
        async fn execute(&self, stmt: &str) -> Result<(), ConfigError> {
            self.seen.lock().unwrap().push(stmt.to_string());
            if !self.needle.is_empty() && stmt.contains(self.needle) {
                return Err(ConfigError::Execute {
                    stmt: stmt.to_string(),
                    reason: "boom".into(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn migrate_runs_all_statements() {
        let t = Table::new("t").column("a", "int").column("b", "int");
        let exec = FailOn::default();
        t.migrate(&exec).await.unwrap();
        assert_eq!(*exec.seen.lock().unwrap(), t.ddl());
    }

    #[tokio::test]
    async fn migrate_stops_on_first_failure() {
        let t = Table::new("t").column("a", "int").column("b", "int");
        let exec = FailOn {
            needle: "column if not exists a",
            ..Default::default()
        };
        let err = t.migrate(&exec).await.unwrap_err();
        assert!(matches!(err, ConfigError::Execute { .. }));
        assert_eq!(exec.seen.lock().unwrap().len(), 2);
    }
}
