use super::RelationId;
use crate::ast::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::LeftOuter => write!(f, "LEFT OUTER JOIN"),
        }
    }
}

/// Join of two operands on an equality predicate.
///
/// Output columns are the left operand's followed by the right operand's.
/// For a left outer join, rows without a right-hand match carry nulls in
/// every right-side column.
#[derive(Debug, Clone)]
pub struct Join {
    kind: JoinKind,
    left: RelationId,
    right: RelationId,
    predicate: Expression,
}

impl Join {
    pub(crate) fn new(
        kind: JoinKind,
        left: RelationId,
        right: RelationId,
        predicate: Expression,
    ) -> Self {
        Self {
            kind,
            left,
            right,
            predicate,
        }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn left(&self) -> RelationId {
        self.left
    }

    pub fn right(&self) -> RelationId {
        self.right
    }

    pub fn predicate(&self) -> &Expression {
        &self.predicate
    }
}
