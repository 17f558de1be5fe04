//! Structural equality of relations.
//!
//! Relations carry no identity beyond their structure: two selections built
//! separately over the same table with the same predicate are equal.

use super::{Algebra, DerivedId, Relation, RelationId};
use crate::ast::Expression;

impl Algebra {
    pub fn relations_equal(&self, a: RelationId, b: RelationId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            // Table names are unique within an arena.
            (Relation::Table(_), Relation::Table(_)) => false,
            (Relation::Selection(x), Relation::Selection(y)) => {
                self.relations_equal(x.operand(), y.operand())
                    && self.expressions_equal(x.predicate(), y.predicate())
            }
            (Relation::Projection(x), Relation::Projection(y)) => {
                self.relations_equal(x.operand(), y.operand())
                    && x.projected_table() == y.projected_table()
                    && x.projected_columns().len() == y.projected_columns().len()
                    && x
                        .projected_columns()
                        .iter()
                        .zip(y.projected_columns())
                        .all(|(c, d)| self.same_derivation(*c, *d))
            }
            (Relation::Join(x), Relation::Join(y)) => {
                x.kind() == y.kind()
                    && self.relations_equal(x.left(), y.left())
                    && self.relations_equal(x.right(), y.right())
                    && self.expressions_equal(x.predicate(), y.predicate())
            }
            _ => false,
        }
    }

    pub fn expressions_equal(&self, a: &Expression, b: &Expression) -> bool {
        match (a, b) {
            (Expression::Derived(x), Expression::Derived(y)) => self.derived_equal(*x, *y),
            (Expression::Eq(l1, r1), Expression::Eq(l2, r2)) => {
                self.expressions_equal(l1, l2) && self.expressions_equal(r1, r2)
            }
            (
                Expression::Aggregate { func: f1, arg: a1 },
                Expression::Aggregate { func: f2, arg: a2 },
            ) => f1 == f2 && self.expressions_equal(a1, a2),
            (
                Expression::Aliased { expr: e1, alias: n1 },
                Expression::Aliased { expr: e2, alias: n2 },
            ) => n1 == n2 && self.expressions_equal(e1, e2),
            _ => a == b,
        }
    }

    fn derived_equal(&self, a: DerivedId, b: DerivedId) -> bool {
        a == b
            || (self.relations_equal(self.derived(a).relation(), self.derived(b).relation())
                && self.same_derivation(a, b))
    }

    /// Same alias and ancestor, owners aside.
    fn same_derivation(&self, a: DerivedId, b: DerivedId) -> bool {
        let (x, y) = (self.derived(a), self.derived(b));
        x.alias() == y.alias() && self.expressions_equal(x.ancestor(), y.ancestor())
    }
}
