//! The relation tree.
//!
//! Every relation and every derived column lives in an [`Algebra`] arena and
//! is addressed by a copyable handle. A relation derives its output columns
//! once, in its constructor, so nothing in the arena changes after a node is
//! pushed and a shared `&Algebra` can be compiled from any number of threads.

mod equality;
mod handle;
mod inference;
mod join;
mod projection;
mod resolve;
mod selection;
mod table;

pub use handle::RelationHandle;
pub use join::{Join, JoinKind};
pub use projection::{ProjectArg, Projection, TableRecord};
pub use selection::Selection;
pub use table::{Column, Table};

use crate::ast::{ColumnType, Expr, Expression, ToPredicate};
use crate::error::{KeepError, KeepResult};
use crate::transpiler::QueryBuilder;
use crate::wire;
use std::collections::HashMap;

/// Handle to a relation in an [`Algebra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub(crate) usize);

/// Handle to a derived column in an [`Algebra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivedId(pub(crate) usize);

/// Handle to a physical column: owning table plus declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId {
    pub(crate) table: RelationId,
    pub(crate) index: usize,
}

impl ColumnId {
    pub fn table(&self) -> RelationId {
        self.table
    }
}

/// A column as seen through one relation.
///
/// The owning relation is a handle, never an owner. Within one relation each
/// distinct ancestor expression is derived at most once.
#[derive(Debug, Clone)]
pub struct DerivedColumn {
    relation: RelationId,
    ancestor: Expression,
    alias: Option<String>,
    name: String,
}

impl DerivedColumn {
    pub fn relation(&self) -> RelationId {
        self.relation
    }

    pub fn ancestor(&self) -> &Expression {
        &self.ancestor
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Alias if set, else the ancestor's own name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Per-relation memo of derived columns.
#[derive(Debug, Default, Clone)]
pub(crate) struct DerivedColumns {
    order: Vec<DerivedId>,
    by_ancestor: HashMap<Expression, DerivedId>,
    by_name: HashMap<String, DerivedId>,
}

impl DerivedColumns {
    pub(crate) fn by_ancestor(&self, ancestor: &Expression) -> Option<DerivedId> {
        self.by_ancestor.get(ancestor).copied()
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<DerivedId> {
        self.by_name.get(name).copied()
    }
}

/// A node of the relation tree.
#[derive(Debug, Clone)]
pub enum Relation {
    Table(Table),
    Selection(Selection),
    Projection(Projection),
    Join(Join),
}

impl Relation {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Relation::Table(_) => "table",
            Relation::Selection(_) => "selection",
            Relation::Projection(_) => "projection",
            Relation::Join(j) => match j.kind() {
                JoinKind::Inner => "inner join",
                JoinKind::LeftOuter => "left join",
            },
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) relation: Relation,
    pub(crate) derived: DerivedColumns,
}

/// Arena owning a relation tree (or forest).
#[derive(Debug, Default, Clone)]
pub struct Algebra {
    nodes: Vec<Node>,
    derived: Vec<DerivedColumn>,
    tables_by_name: HashMap<String, RelationId>,
}

impl Algebra {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent composition starting at `id`.
    pub fn relation(&mut self, id: RelationId) -> RelationHandle<'_> {
        RelationHandle::new(self, id)
    }

    pub fn get(&self, id: RelationId) -> &Relation {
        &self.nodes[id.0].relation
    }

    pub fn derived(&self, id: DerivedId) -> &DerivedColumn {
        &self.derived[id.0]
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        match self.get(id.table) {
            Relation::Table(t) => &t.columns()[id.index],
            other => unreachable!("column handle points at a {}", other.kind()),
        }
    }

    /// The relation's output columns, in their stable order.
    pub fn columns(&self, id: RelationId) -> &[DerivedId] {
        &self.nodes[id.0].derived.order
    }

    /// Names of the relation's output columns.
    pub fn column_names(&self, id: RelationId) -> Vec<&str> {
        self.columns(id)
            .iter()
            .map(|dc| self.derived(*dc).name())
            .collect()
    }

    pub fn table_named(&self, name: &str) -> Option<RelationId> {
        self.tables_by_name.get(name).copied()
    }

    pub fn table(&self, id: RelationId) -> Option<&Table> {
        match self.get(id) {
            Relation::Table(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn node(&self, id: RelationId) -> &Node {
        &self.nodes[id.0]
    }

    fn next_id(&self) -> RelationId {
        RelationId(self.nodes.len())
    }

    fn push(&mut self, relation: Relation, derived: DerivedColumns) -> RelationId {
        let id = self.next_id();
        self.nodes.push(Node { relation, derived });
        id
    }

    /// Declare a table with its columns in order.
    pub fn create_table<N, I>(&mut self, name: &str, columns: I) -> KeepResult<RelationId>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, ColumnType)>,
    {
        if self.tables_by_name.contains_key(name) {
            return Err(KeepError::DuplicateTable(name.to_string()));
        }
        let id = self.next_id();
        let mut table = Table::new(name);
        for (column, column_type) in columns {
            table.def_column(id, column.into(), column_type);
        }

        let mut memo = DerivedColumns::default();
        for (index, column) in table.columns().iter().enumerate() {
            let ancestor = Expression::Column(ColumnId { table: id, index });
            self.derive(id, &mut memo, ancestor, Some(column.name().to_string()))?;
        }

        self.tables_by_name.insert(name.to_string(), id);
        Ok(self.push(Relation::Table(table), memo))
    }

    /// Filter `operand` by `predicate`.
    ///
    /// Names in the predicate are resolved against the operand immediately.
    pub fn selection(
        &mut self,
        operand: RelationId,
        predicate: impl ToPredicate,
    ) -> KeepResult<RelationId> {
        let building = format!("selection on {}", self.describe(operand));
        let predicate = self.resolve(&predicate.to_predicate()?, &[operand], &building)?;

        let id = self.next_id();
        let mut memo = DerivedColumns::default();
        for column in self.columns(operand).to_vec() {
            self.derive(id, &mut memo, Expression::Derived(column), None)?;
        }
        Ok(self.push(Relation::Selection(Selection::new(operand, predicate)), memo))
    }

    /// Project `operand` onto `args`.
    ///
    /// A single argument naming a table reachable through the operand is a
    /// table projection; anything else is a list of columns.
    pub fn projection<A, I>(&mut self, operand: RelationId, args: I) -> KeepResult<RelationId>
    where
        A: Into<ProjectArg>,
        I: IntoIterator<Item = A>,
    {
        let args: Vec<ProjectArg> = args.into_iter().map(Into::into).collect();
        let building = format!("projection of {}", self.describe(operand));
        if args.is_empty() {
            return Err(KeepError::InvalidProjection(format!("{} has no columns", building)));
        }
        let id = self.next_id();
        let mut memo = DerivedColumns::default();

        let projection = match self.detect_projected_table(operand, &args) {
            Some(table) => {
                let columns: Vec<Expr> = self
                    .table(table)
                    .map(|t| t.qualified_column_aliases())
                    .unwrap_or_default();
                for expr in columns {
                    let resolved = self.resolve(&expr, &[operand], &building)?;
                    self.derive(id, &mut memo, resolved, None)?;
                }
                Projection::table_projection(operand, table)
            }
            None => {
                let mut projected = Vec::with_capacity(args.len());
                for arg in args {
                    let expr = arg.into_column_expr()?;
                    let resolved = self.resolve(&expr, &[operand], &building)?;
                    let column = self.derive(id, &mut memo, resolved, None)?;
                    let name = self.derived(column).name();
                    if projected
                        .iter()
                        .any(|other| *other != column && self.derived(*other).name() == name)
                    {
                        return Err(KeepError::InvalidProjection(format!(
                            "{} names '{}' twice; alias one of them",
                            building, name
                        )));
                    }
                    if !projected.contains(&column) {
                        projected.push(column);
                    }
                }
                Projection::column_projection(operand, projected)
            }
        };
        Ok(self.push(Relation::Projection(projection), memo))
    }

    pub fn inner_join(
        &mut self,
        left: RelationId,
        right: RelationId,
        predicate: impl ToPredicate,
    ) -> KeepResult<RelationId> {
        self.join(JoinKind::Inner, left, right, predicate)
    }

    pub fn left_join(
        &mut self,
        left: RelationId,
        right: RelationId,
        predicate: impl ToPredicate,
    ) -> KeepResult<RelationId> {
        self.join(JoinKind::LeftOuter, left, right, predicate)
    }

    /// Join `left` and `right`; the predicate resolves against both operands,
    /// left first.
    pub fn join(
        &mut self,
        kind: JoinKind,
        left: RelationId,
        right: RelationId,
        predicate: impl ToPredicate,
    ) -> KeepResult<RelationId> {
        let building = format!(
            "join of {} and {}",
            self.describe(left),
            self.describe(right)
        );
        if self.join_units(left).contains(&right) {
            return Err(KeepError::RepeatedJoinOperand(self.describe(right)));
        }
        let predicate = self.resolve(&predicate.to_predicate()?, &[left, right], &building)?;

        let id = self.next_id();
        let mut memo = DerivedColumns::default();
        let operand_columns: Vec<DerivedId> = self
            .columns(left)
            .iter()
            .chain(self.columns(right))
            .copied()
            .collect();
        for column in operand_columns {
            self.derive(id, &mut memo, Expression::Derived(column), None)?;
        }
        Ok(self.push(Relation::Join(Join::new(kind, left, right, predicate)), memo))
    }

    /// Relations that render as their own FROM unit when `id` is a join's left
    /// operand: the right side of every join along the left spine, and the
    /// leftmost operand.
    fn join_units(&self, id: RelationId) -> Vec<RelationId> {
        match self.get(id) {
            Relation::Join(join) => {
                let mut units = self.join_units(join.left());
                units.push(join.right());
                units
            }
            _ => vec![id],
        }
    }

    /// Locate a base table reachable through `id` by exact name.
    pub fn get_table(&self, id: RelationId, name: &str) -> Option<RelationId> {
        match self.get(id) {
            Relation::Table(t) => (t.name() == name).then_some(id),
            Relation::Selection(s) => self.get_table(s.operand(), name),
            Relation::Projection(p) => p
                .projected_table()
                .filter(|table| self.table(*table).is_some_and(|t| t.name() == name)),
            Relation::Join(j) => self
                .get_table(j.left(), name)
                .or_else(|| self.get_table(j.right(), name)),
        }
    }

    /// Resolve a (possibly qualified) name against the columns `id` exposes.
    pub fn get_column(&self, id: RelationId, name: &str) -> Option<DerivedId> {
        let node = self.node(id);
        match &node.relation {
            Relation::Table(t) => t.column_index(name).map(|index| node.derived.order[index]),
            Relation::Selection(s) => self.get_column_through(node, &[s.operand()], name),
            Relation::Join(j) => self.get_column_through(node, &[j.left(), j.right()], name),
            Relation::Projection(p) => {
                if name.contains(crate::ast::QUALIFIER_DELIMITER) {
                    self.get_column_through(node, &[p.operand()], name)
                } else {
                    node.derived.by_name(name)
                }
            }
        }
    }

    fn get_column_through(
        &self,
        node: &Node,
        operands: &[RelationId],
        name: &str,
    ) -> Option<DerivedId> {
        operands
            .iter()
            .find_map(|operand| self.get_column(*operand, name))
            .and_then(|found| node.derived.by_ancestor(&Expression::Derived(found)))
    }

    /// Human-readable description used in error messages.
    pub fn describe(&self, id: RelationId) -> String {
        match self.get(id) {
            Relation::Table(t) => format!("table {}", t.name()),
            Relation::Selection(s) => format!("selection on {}", self.describe(s.operand())),
            Relation::Projection(p) => format!("projection of {}", self.describe(p.operand())),
            Relation::Join(j) => format!(
                "{} of {} and {}",
                self.get(id).kind(),
                self.describe(j.left()),
                self.describe(j.right())
            ),
        }
    }

    /// Compile `id` to `(sql, placeholders)`.
    pub fn to_sql(&self, id: RelationId) -> KeepResult<(String, crate::transpiler::Placeholders)> {
        let query = QueryBuilder::build(self, id)?;
        Ok(query.render())
    }

    /// Compile `id`, keeping the builder for tuple construction.
    pub fn query(&self, id: RelationId) -> KeepResult<QueryBuilder<'_>> {
        QueryBuilder::build(self, id)
    }

    pub fn wire_representation(&self, id: RelationId) -> KeepResult<serde_json::Value> {
        wire::to_wire(self, id)
    }

    pub fn from_wire(&mut self, json: &serde_json::Value) -> KeepResult<RelationId> {
        wire::from_wire(self, json)
    }
}
