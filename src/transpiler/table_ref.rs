//! What can appear after `FROM`.

use super::column::SqlExpr;
use super::query::QueryBuilder;
use super::traits::{escape_identifier, ToSql};
use crate::relation::{JoinKind, RelationId};

/// A single FROM-clause unit: a bare table or an aliased subquery.
#[derive(Debug, Clone)]
pub enum SingularRef<'a> {
    Table { relation: RelationId, name: String },
    Subquery {
        relation: RelationId,
        alias: String,
        query: Box<QueryBuilder<'a>>,
    },
}

impl<'a> SingularRef<'a> {
    pub fn relation(&self) -> RelationId {
        match self {
            SingularRef::Table { relation, .. } | SingularRef::Subquery { relation, .. } => {
                *relation
            }
        }
    }

    /// Name columns drawn from this unit are qualified with.
    pub fn qualifier(&self) -> &str {
        match self {
            SingularRef::Table { name, .. } => name,
            SingularRef::Subquery { alias, .. } => alias,
        }
    }

    pub(crate) fn as_subquery_mut(&mut self) -> Option<(&str, &mut QueryBuilder<'a>)> {
        match self {
            SingularRef::Subquery { alias, query, .. } => Some((alias.as_str(), query.as_mut())),
            SingularRef::Table { .. } => None,
        }
    }
}

impl ToSql for SingularRef<'_> {
    fn to_sql(&self) -> String {
        match self {
            SingularRef::Table { name, .. } => escape_identifier(name),
            SingularRef::Subquery { alias, query, .. } => {
                format!("({}) AS {}", query.sql(), escape_identifier(alias))
            }
        }
    }
}

/// A FROM clause. Singular units are owned by the builder and referenced by
/// index, so a relation reused in one compile keeps one alias.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    Singular(usize),
    /// Left-associative: `left` may itself be a join, `right` never is.
    Join {
        kind: JoinKind,
        left: Box<TableRef>,
        right: usize,
        predicate: SqlExpr,
    },
}

impl TableRef {
    pub fn to_sql(&self, units: &[SingularRef<'_>]) -> String {
        match self {
            TableRef::Singular(index) => units[*index].to_sql(),
            TableRef::Join {
                kind,
                left,
                right,
                predicate,
            } => format!(
                "{} {} {} ON {}",
                left.to_sql(units),
                kind,
                units[*right].to_sql(),
                predicate.to_sql()
            ),
        }
    }

    /// Singular units in left-to-right order.
    pub fn units(&self) -> Vec<usize> {
        match self {
            TableRef::Singular(index) => vec![*index],
            TableRef::Join { left, right, .. } => {
                let mut units = left.units();
                units.push(*right);
                units
            }
        }
    }
}
