//! Declarative table definitions.
//!
//! ```toml
//! [[tables]]
//! name = "blogs"
//! columns = [
//!     { name = "id", type = "integer" },
//!     { name = "title", type = "string" },
//! ]
//! ```

use crate::ast::ColumnType;
use crate::error::{KeepError, KeepResult};
use crate::relation::{Algebra, RelationId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column definition in schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
}

/// Table schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

/// Schema configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

impl SchemaConfig {
    pub fn from_toml(content: &str) -> KeepResult<Self> {
        toml::from_str(content)
            .map_err(|e| KeepError::Config(format!("Failed to parse schema: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> KeepResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeepError::Config(format!("Failed to read schema {}: {}", path.display(), e))
        })?;
        let schema = Self::from_toml(&content)?;
        tracing::info!("Loaded {} table schemas from {}", schema.tables.len(), path.display());
        Ok(schema)
    }

    /// Declare every table in `algebra`, in file order.
    pub fn declare(&self, algebra: &mut Algebra) -> KeepResult<Vec<RelationId>> {
        self.tables
            .iter()
            .map(|table| -> KeepResult<RelationId> {
                let columns = table
                    .columns
                    .iter()
                    .map(|c| -> KeepResult<(String, ColumnType)> {
                        Ok((c.name.clone(), c.col_type.parse()?))
                    })
                    .collect::<KeepResult<Vec<_>>>()?;
                tracing::debug!("Declaring table: {}", table.name);
                algebra.create_table(&table.name, columns)
            })
            .collect()
    }

    /// A fresh arena holding this schema's tables.
    pub fn to_algebra(&self) -> KeepResult<Algebra> {
        let mut algebra = Algebra::new();
        self.declare(&mut algebra)?;
        Ok(algebra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
        [[tables]]
        name = "blogs"
        columns = [
            { name = "id", type = "integer" },
            { name = "user_id", type = "integer" },
            { name = "title", type = "string" },
        ]

        [[tables]]
        name = "posts"
        columns = [
            { name = "id", type = "integer" },
            { name = "blog_id", type = "integer" },
            { name = "published_at", type = "datetime" },
        ]
    "#;

    #[test]
    fn test_declares_tables() {
        let algebra = SchemaConfig::from_toml(SCHEMA).unwrap().to_algebra().unwrap();

        let blogs = algebra.table_named("blogs").unwrap();
        assert_eq!(algebra.column_names(blogs), vec!["id", "user_id", "title"]);
        let posts = algebra.table(algebra.table_named("posts").unwrap()).unwrap();
        assert_eq!(
            posts.get("published_at").unwrap().column_type(),
            ColumnType::Datetime
        );
    }

    #[test]
    fn test_bad_column_type() {
        let schema = SchemaConfig::from_toml(
            r#"
            [[tables]]
            name = "blogs"
            columns = [{ name = "id", type = "uuid" }]
            "#,
        )
        .unwrap();
        assert!(matches!(schema.to_algebra(), Err(KeepError::Config(_))));
    }

    #[test]
    fn test_duplicate_table() {
        let mut schema = SchemaConfig::from_toml(SCHEMA).unwrap();
        schema.tables.push(schema.tables[0].clone());
        assert!(matches!(schema.to_algebra(), Err(KeepError::DuplicateTable(_))));
    }
}
