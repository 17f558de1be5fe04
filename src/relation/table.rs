use super::RelationId;
use crate::ast::{col, qualify, split_qualified, ColumnType, Expr};
use std::collections::HashMap;

/// A physical column. The table handle is for lookup only.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    table: RelationId,
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn table(&self) -> RelationId {
        self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// A base table: a name and its columns in declaration order.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    index_by_name: HashMap<String, usize>,
}

impl Table {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            index_by_name: HashMap::new(),
        }
    }

    /// Declare a column. Re-declaring a name replaces its type in place.
    pub(crate) fn def_column(&mut self, table: RelationId, name: String, column_type: ColumnType) {
        if let Some(&index) = self.index_by_name.get(&name) {
            self.columns[index].column_type = column_type;
            return;
        }
        self.index_by_name.insert(name.clone(), self.columns.len());
        self.columns.push(Column {
            table,
            name,
            column_type,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|index| &self.columns[index])
    }

    /// Qualified reference to one of this table's columns (`blogs__id`).
    pub fn qualified(&self, column: &str) -> Expr {
        col(qualify(&self.name, column))
    }

    /// Index of a column by name.
    ///
    /// A qualifier acts as a filter: a name qualified with another table's
    /// name finds nothing.
    pub(crate) fn column_index(&self, name: &str) -> Option<usize> {
        let field = match split_qualified(name) {
            Some((qualifier, field)) if qualifier == self.name => field,
            Some(_) => return None,
            None => name,
        };
        self.index_by_name.get(field).copied()
    }

    /// `blogs__id AS id` for every column, as used by table projections.
    pub(crate) fn qualified_column_aliases(&self) -> Vec<Expr> {
        self.columns
            .iter()
            .map(|c| col(qualify(&self.name, &c.name)).alias(c.name.clone()))
            .collect()
    }
}
