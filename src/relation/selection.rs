use super::RelationId;
use crate::ast::Expression;

/// Filter of an operand by an equality predicate.
///
/// The predicate is bound to the operand's columns when the selection is
/// built, not when it is compiled.
#[derive(Debug, Clone)]
pub struct Selection {
    operand: RelationId,
    predicate: Expression,
}

impl Selection {
    pub(crate) fn new(operand: RelationId, predicate: Expression) -> Self {
        Self { operand, predicate }
    }

    pub fn operand(&self) -> RelationId {
        self.operand
    }

    pub fn predicate(&self) -> &Expression {
        &self.predicate
    }
}
