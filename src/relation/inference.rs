//! Foreign-key inference for joins written without a predicate.

use super::{Algebra, DerivedId, JoinKind, Relation, RelationId};
use crate::ast::{col, qualify, Expression};
use crate::error::{KeepError, KeepResult};

/// Naive English singular: `categories` → `category`, `posts` → `post`.
fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{}y", stem)
    } else if name.ends_with('s') && !name.ends_with("ss") {
        name[..name.len() - 1].to_string()
    } else {
        name.to_string()
    }
}

impl Algebra {
    /// Find a `<table>_id` column among `other_columns` that points at this
    /// relation's `id`.
    ///
    /// Returns the qualified names `(own id, foreign key)`.
    pub fn infer_join_columns(
        &self,
        id: RelationId,
        other_columns: &[DerivedId],
    ) -> KeepResult<Option<(String, String)>> {
        match self.get(id) {
            Relation::Table(table) => {
                if table.get("id").is_none() {
                    return Ok(None);
                }
                let foreign_key = format!("{}_id", singularize(table.name()));
                Ok(other_columns
                    .iter()
                    .find(|dc| self.derived(**dc).name() == foreign_key)
                    .map(|dc| {
                        (
                            qualify(table.name(), "id"),
                            self.qualified_column_name(*dc),
                        )
                    }))
            }
            Relation::Selection(s) => self.infer_join_columns(s.operand(), other_columns),
            Relation::Projection(p) => match p.projected_table() {
                Some(table) => self.infer_join_columns(table, other_columns),
                None => Err(KeepError::UnsupportedJoinInference(format!(
                    "cannot infer join columns through {}",
                    self.describe(id)
                ))),
            },
            Relation::Join(j) => match self.infer_join_columns(j.left(), other_columns)? {
                Some(pair) => Ok(Some(pair)),
                None => self.infer_join_columns(j.right(), other_columns),
            },
        }
    }

    /// Join two relations on an inferred `id` / `<table>_id` pair.
    pub fn join_inferred(
        &mut self,
        kind: JoinKind,
        left: RelationId,
        right: RelationId,
    ) -> KeepResult<RelationId> {
        let right_columns = self.columns(right).to_vec();
        let left_columns = self.columns(left).to_vec();

        let (left_name, right_name) = match self.infer_join_columns(left, &right_columns)? {
            Some(pair) => pair,
            None => match self.infer_join_columns(right, &left_columns)? {
                Some((right_id, left_fk)) => (left_fk, right_id),
                None => {
                    return Err(KeepError::UnsupportedJoinInference(format!(
                        "no foreign key relates {} and {}",
                        self.describe(left),
                        self.describe(right)
                    )));
                }
            },
        };
        self.join(kind, left, right, col(left_name).eq(col(right_name)))
    }

    /// `table__column` for a column that reads a physical column, else its
    /// plain name.
    fn qualified_column_name(&self, dc: DerivedId) -> String {
        let derived = self.derived(dc);
        match self.physical_column(&Expression::Derived(dc)) {
            Some(physical) => {
                let table = self
                    .table(physical.table())
                    .map(|t| t.name().to_string())
                    .unwrap_or_default();
                qualify(&table, self.column(physical).name())
            }
            None => derived.name().to_string(),
        }
    }
}
