//! Column references and expressions as they appear in emitted SQL.

use crate::ast::{qualify, AggregateFunc, Value};
use crate::transpiler::traits::{escape_identifier, ToSql};
use serde::Serialize;

/// A column reference in SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlColumn {
    /// `blogs.id`
    Table { table: String, name: String },
    /// `t1.id`, where `id` is the name the subquery's select list exposes.
    Subquery { alias: String, name: String },
}

impl SqlColumn {
    pub fn qualifier(&self) -> &str {
        match self {
            SqlColumn::Table { table, .. } => table,
            SqlColumn::Subquery { alias, .. } => alias,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SqlColumn::Table { name, .. } | SqlColumn::Subquery { name, .. } => name,
        }
    }

    /// `blogs__id`, `t2__posts__id`.
    pub fn qualified_name(&self) -> String {
        qualify(self.qualifier(), self.name())
    }
}

impl ToSql for SqlColumn {
    fn to_sql(&self) -> String {
        format!(
            "{}.{}",
            escape_identifier(self.qualifier()),
            escape_identifier(self.name())
        )
    }
}

/// An expression after query-time resolution: columns are SQL references and
/// literals are placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlExpr {
    Column(SqlColumn),
    Placeholder(String),
    Eq(Box<SqlExpr>, Box<SqlExpr>),
    Aggregate {
        func: AggregateFunc,
        arg: Box<SqlExpr>,
    },
}

impl ToSql for SqlExpr {
    fn to_sql(&self) -> String {
        match self {
            SqlExpr::Column(column) => column.to_sql(),
            SqlExpr::Placeholder(name) => format!(":{}", name),
            SqlExpr::Eq(left, right) => format!("{} = {}", left.to_sql(), right.to_sql()),
            SqlExpr::Aggregate { func, arg } => format!("{}({})", func, arg.to_sql()),
        }
    }
}

impl SqlExpr {
    /// Name that stays unique across both sides of a join.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            SqlExpr::Column(column) => Some(column.qualified_name()),
            SqlExpr::Aggregate { func, .. } => Some(func.name().to_string()),
            _ => None,
        }
    }

    /// Name the expression is visible under in a `SELECT *`.
    pub fn bare_name(&self) -> Option<&str> {
        match self {
            SqlExpr::Column(column) => Some(column.name()),
            _ => None,
        }
    }
}

/// One select-list entry: `<expr> AS <name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryColumn {
    pub name: String,
    pub expr: SqlExpr,
}

impl ToSql for QueryColumn {
    fn to_sql(&self) -> String {
        format!("{} AS {}", self.expr.to_sql(), escape_identifier(&self.name))
    }
}

/// Literal values keyed by generated placeholder name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Placeholders {
    entries: Vec<(String, Value)>,
}

impl Placeholders {
    /// Record a literal under the next name (`v1`, `v2`, ...).
    pub fn add(&mut self, value: Value) -> String {
        let name = format!("v{}", self.entries.len() + 1);
        self.entries.push((name.clone(), value));
        name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// `{"v1": 1, ...}` with plain JSON scalars.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Placeholders {
    fn from(entries: [(&str, Value); N]) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        let column = SqlColumn::Subquery {
            alias: "t2".to_string(),
            name: "posts__id".to_string(),
        };
        assert_eq!(column.to_sql(), "t2.posts__id");
        assert_eq!(column.qualified_name(), "t2__posts__id");

        let entry = QueryColumn {
            name: column.qualified_name(),
            expr: SqlExpr::Column(column),
        };
        assert_eq!(entry.to_sql(), "t2.posts__id AS t2__posts__id");
    }

    #[test]
    fn test_placeholders_in_order() {
        let mut placeholders = Placeholders::default();
        placeholders.add(Value::Integer(1));
        placeholders.add(Value::Integer(1));
        assert_eq!(
            placeholders.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["v1", "v2"]
        );
        assert_eq!(placeholders.to_json(), serde_json::json!({"v1": 1, "v2": 1}));
    }
}
