//! Structural resolution: binding names in an [`Expr`] to derived columns.

use super::{Algebra, DerivedColumn, DerivedColumns, DerivedId, RelationId};
use crate::ast::{Expr, Expression, QUALIFIER_DELIMITER};
use crate::error::{KeepError, KeepResult};

impl Algebra {
    /// Bind every column reference in `expr` against `operands`.
    ///
    /// Operands are asked left to right and the first one exposing a name
    /// wins. An unqualified name exposed by several operands is not an error;
    /// the leftmost operand shadows the others.
    pub(crate) fn resolve(
        &self,
        expr: &Expr,
        operands: &[RelationId],
        building: &str,
    ) -> KeepResult<Expression> {
        match expr {
            Expr::Column(name) => self.resolve_name(name, operands, building),
            Expr::Literal(value) => Ok(Expression::Literal(value.clone())),
            Expr::Aliased { expr, alias } => Ok(Expression::Aliased {
                expr: Box::new(self.resolve(expr, operands, building)?),
                alias: alias.clone(),
            }),
            Expr::Eq(left, right) => Ok(Expression::eq(
                self.resolve(left, operands, building)?,
                self.resolve(right, operands, building)?,
            )),
            Expr::Aggregate { func, arg } => Ok(Expression::Aggregate {
                func: *func,
                arg: Box::new(self.resolve(arg, operands, building)?),
            }),
        }
    }

    fn resolve_name(
        &self,
        name: &str,
        operands: &[RelationId],
        building: &str,
    ) -> KeepResult<Expression> {
        for (position, operand) in operands.iter().enumerate() {
            if let Some(found) = self.get_column(*operand, name) {
                if !name.contains(QUALIFIER_DELIMITER)
                    && operands[position + 1..]
                        .iter()
                        .any(|other| self.get_column(*other, name).is_some())
                {
                    tracing::debug!(
                        "column '{}' is exposed by several operands of {}; using {}",
                        name,
                        building,
                        self.describe(*operand)
                    );
                }
                return Ok(Expression::Derived(found));
            }
        }
        Err(KeepError::unresolved(name, building))
    }

    /// Derive `resolved` as a column of `owner`, reusing the memoized column
    /// when the same ancestor was derived before.
    ///
    /// An outer [`Expression::Aliased`] is stripped and becomes the alias.
    pub(crate) fn derive(
        &mut self,
        owner: RelationId,
        memo: &mut DerivedColumns,
        resolved: Expression,
        name_hint: Option<String>,
    ) -> KeepResult<DerivedId> {
        let (ancestor, alias) = match resolved {
            Expression::Aliased { expr, alias } => (*expr, Some(alias)),
            other => (other, None),
        };
        if let Some(existing) = memo.by_ancestor(&ancestor) {
            return Ok(existing);
        }

        let name = alias
            .clone()
            .or(name_hint)
            .or_else(|| self.expression_name(&ancestor))
            .ok_or_else(|| {
                KeepError::InvalidProjection(
                    "expressions without a column name need an alias".to_string(),
                )
            })?;

        let id = DerivedId(self.derived.len());
        self.derived.push(DerivedColumn {
            relation: owner,
            ancestor: ancestor.clone(),
            alias,
            name: name.clone(),
        });
        memo.order.push(id);
        memo.by_ancestor.insert(ancestor, id);
        memo.by_name.insert(name, id);
        Ok(id)
    }

    /// Output name of a resolved expression, if it has one.
    pub(crate) fn expression_name(&self, expr: &Expression) -> Option<String> {
        match expr {
            Expression::Column(id) => Some(self.column(*id).name().to_string()),
            Expression::Derived(id) => Some(self.derived(*id).name().to_string()),
            Expression::Aliased { alias, .. } => Some(alias.clone()),
            Expression::Aggregate { func, .. } => Some(func.name().to_string()),
            Expression::Literal(_) | Expression::Eq(..) => None,
        }
    }

    /// Follow a derived column down to the physical column it reads, if any.
    pub fn physical_column(&self, expr: &Expression) -> Option<super::ColumnId> {
        match expr {
            Expression::Column(id) => Some(*id),
            Expression::Derived(id) => self.physical_column(self.derived(*id).ancestor()),
            _ => None,
        }
    }
}
