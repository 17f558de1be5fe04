use crate::ast::{AggregateFunc, Value};
use crate::relation::{ColumnId, DerivedId};

/// An expression whose names have been bound to columns.
///
/// Produced by structural resolution against a relation's operands. Derived
/// columns are referenced by handle, so two resolutions through the same
/// relation compare equal exactly when they hit the same memoized column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// A physical column of a table.
    Column(ColumnId),
    /// A column derived by some relation.
    Derived(DerivedId),
    Literal(Value),
    /// Transient wrapper; stripped when the expression is derived.
    Aliased {
        expr: Box<Expression>,
        alias: String,
    },
    Eq(Box<Expression>, Box<Expression>),
    Aggregate {
        func: AggregateFunc,
        arg: Box<Expression>,
    },
}

impl Expression {
    pub fn eq(left: Expression, right: Expression) -> Expression {
        Expression::Eq(Box::new(left), Box::new(right))
    }

    /// Left operand of an equality.
    pub fn left(&self) -> Option<&Expression> {
        match self {
            Expression::Eq(left, _) => Some(left),
            _ => None,
        }
    }

    /// Right operand of an equality.
    pub fn right(&self) -> Option<&Expression> {
        match self {
            Expression::Eq(_, right) => Some(right),
            _ => None,
        }
    }

    pub fn as_derived(&self) -> Option<DerivedId> {
        match self {
            Expression::Derived(id) => Some(*id),
            _ => None,
        }
    }
}
