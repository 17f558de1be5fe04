//! Compilation of one relation tree into one SQL statement.

use super::column::{Placeholders, QueryColumn, SqlColumn, SqlExpr};
use super::table_ref::{SingularRef, TableRef};
use super::traits::ToSql;
use crate::ast::{qualify, Expression};
use crate::error::{KeepError, KeepResult};
use crate::relation::{Algebra, DerivedId, Relation, RelationId};
use crate::tuple::{FieldValues, Record, Tuple};
use std::collections::HashMap;

/// State shared by a query and all of its subqueries.
#[derive(Debug, Clone, Default)]
pub(crate) struct Shared {
    subquery_count: usize,
    placeholders: Placeholders,
}

/// Who turns a result row into a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TupleBuilder {
    /// A column projection: one record in select-list order.
    Projection,
    /// A table projection: a record shaped like the table.
    Table(RelationId),
}

/// Accumulates the parts of a `SELECT` while a relation is visited.
///
/// A builder is confined to one compile. Subqueries get their own builder,
/// but placeholder numbering and alias numbering run across all of them.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    algebra: &'a Algebra,
    relation: RelationId,
    select_list: Option<Vec<QueryColumn>>,
    table_ref: Option<TableRef>,
    conditions: Vec<SqlExpr>,
    singular_refs: Vec<SingularRef<'a>>,
    singular_ref_index: HashMap<RelationId, usize>,
    column_cache: HashMap<DerivedId, SqlExpr>,
    tuple_builder: Option<TupleBuilder>,
    projected_table_ref: Option<usize>,
    pub(crate) shared: Shared,
}

impl<'a> QueryBuilder<'a> {
    fn new(algebra: &'a Algebra, relation: RelationId, shared: Shared) -> Self {
        Self {
            algebra,
            relation,
            select_list: None,
            table_ref: None,
            conditions: Vec::new(),
            singular_refs: Vec::new(),
            singular_ref_index: HashMap::new(),
            column_cache: HashMap::new(),
            tuple_builder: None,
            projected_table_ref: None,
            shared,
        }
    }

    /// Compile `relation`.
    pub fn build(algebra: &'a Algebra, relation: RelationId) -> KeepResult<Self> {
        tracing::debug!("compiling {}", algebra.describe(relation));
        let mut query = Self::new(algebra, relation, Shared::default());
        query.visit(relation)?;
        tracing::debug!(
            subqueries = query.shared.subquery_count,
            placeholders = query.shared.placeholders.len(),
            "compiled {}",
            algebra.describe(relation)
        );
        Ok(query)
    }

    pub fn relation(&self) -> RelationId {
        self.relation
    }

    /// `None` renders as `*`.
    pub fn select_list(&self) -> Option<&[QueryColumn]> {
        self.select_list.as_deref()
    }

    pub fn table_ref(&self) -> Option<&TableRef> {
        self.table_ref.as_ref()
    }

    pub fn singular_refs(&self) -> &[SingularRef<'a>] {
        &self.singular_refs
    }

    pub fn conditions(&self) -> &[SqlExpr] {
        &self.conditions
    }

    /// The unit a table projection passes through, if any.
    pub fn projected_table_ref(&self) -> Option<&SingularRef<'a>> {
        self.projected_table_ref.map(|index| &self.singular_refs[index])
    }

    /// Literals recorded so far, across this query and its subqueries.
    pub fn placeholders(&self) -> &Placeholders {
        &self.shared.placeholders
    }

    /// `(sql, placeholders)`.
    pub fn render(&self) -> (String, Placeholders) {
        (self.sql(), self.shared.placeholders.clone())
    }

    pub fn sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        match self.select_list.as_deref() {
            Some(columns) if !columns.is_empty() => {
                let columns: Vec<String> = columns.iter().map(ToSql::to_sql).collect();
                sql.push_str(&columns.join(", "));
            }
            _ => sql.push('*'),
        }

        if let Some(table_ref) = &self.table_ref {
            sql.push_str(" FROM ");
            sql.push_str(&table_ref.to_sql(&self.singular_refs));
        }

        if !self.conditions.is_empty() {
            let conditions: Vec<String> = self.conditions.iter().map(ToSql::to_sql).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql
    }

    fn visit(&mut self, id: RelationId) -> KeepResult<()> {
        let algebra = self.algebra;
        match algebra.get(id) {
            Relation::Table(_) => {
                let unit = self.singular_table_ref(id)?;
                self.set_table_ref(TableRef::Singular(unit))
            }
            Relation::Selection(selection) => {
                self.visit(selection.operand())?;
                let condition = self.resolve_in_query(selection.predicate())?;
                self.conditions.push(condition);
                Ok(())
            }
            Relation::Projection(projection) => {
                self.visit(projection.operand())?;
                let columns = self.resolve_columns(id, false)?;
                self.select_list = Some(columns);
                match projection.projected_table() {
                    Some(table) => {
                        self.projected_table_ref = self.singular_ref_index.get(&table).copied();
                        self.tuple_builder = Some(TupleBuilder::Table(table));
                    }
                    None => self.tuple_builder = Some(TupleBuilder::Projection),
                }
                Ok(())
            }
            Relation::Join(_) => {
                let table_ref = self.join_table_ref(id)?;
                self.set_table_ref(table_ref)?;
                let columns = self.resolve_columns(id, true)?;
                self.select_list = Some(columns);
                Ok(())
            }
        }
    }

    /// Install the root FROM clause. A query has exactly one.
    pub(crate) fn set_table_ref(&mut self, table_ref: TableRef) -> KeepResult<()> {
        if self.table_ref.is_some() {
            return Err(KeepError::TableRefAlreadyAssigned);
        }
        self.table_ref = Some(table_ref);
        Ok(())
    }

    /// A join chain is built inline on the left; every other operand is a
    /// single unit.
    fn join_table_ref(&mut self, id: RelationId) -> KeepResult<TableRef> {
        let algebra = self.algebra;
        let Relation::Join(join) = algebra.get(id) else {
            return Ok(TableRef::Singular(self.singular_table_ref(id)?));
        };
        let left = self.join_table_ref(join.left())?;
        let right = self.singular_table_ref(join.right())?;
        let predicate = self.resolve_in_query(join.predicate())?;
        Ok(TableRef::Join {
            kind: join.kind(),
            left: Box::new(left),
            right,
            predicate,
        })
    }

    /// The unit for `id`, built at most once per compile.
    fn singular_table_ref(&mut self, id: RelationId) -> KeepResult<usize> {
        if let Some(&index) = self.singular_ref_index.get(&id) {
            return Ok(index);
        }
        let unit = match self.algebra.table(id) {
            Some(table) => SingularRef::Table {
                relation: id,
                name: table.name().to_string(),
            },
            None => self.subquery(id)?,
        };
        let index = self.singular_refs.len();
        self.singular_refs.push(unit);
        self.singular_ref_index.insert(id, index);
        Ok(index)
    }

    fn subquery(&mut self, id: RelationId) -> KeepResult<SingularRef<'a>> {
        self.shared.subquery_count += 1;
        let alias = format!("t{}", self.shared.subquery_count);
        tracing::trace!("aliasing {} as {}", self.algebra.describe(id), alias);

        let mut query = QueryBuilder::new(self.algebra, id, std::mem::take(&mut self.shared));
        let visited = query.visit(id);
        self.shared = std::mem::take(&mut query.shared);
        visited?;

        Ok(SingularRef::Subquery {
            relation: id,
            alias,
            query: Box::new(query),
        })
    }

    fn resolve_columns(&mut self, id: RelationId, qualified: bool) -> KeepResult<Vec<QueryColumn>> {
        let algebra = self.algebra;
        algebra
            .columns(id)
            .iter()
            .map(|dc| self.resolve_derived_column(*dc, qualified))
            .collect()
    }

    /// Join select lists use qualified names so both sides stay distinct.
    fn resolve_derived_column(
        &mut self,
        id: DerivedId,
        qualified: bool,
    ) -> KeepResult<QueryColumn> {
        let expr = self.resolve_derived(id)?;
        let own_name = self.algebra.derived(id).name();
        let name = if qualified {
            expr.qualified_name().unwrap_or_else(|| own_name.to_string())
        } else {
            own_name.to_string()
        };
        Ok(QueryColumn { name, expr })
    }

    /// Bind a resolved expression to SQL: columns become references and
    /// literals become placeholders.
    pub(crate) fn resolve_in_query(&mut self, expr: &Expression) -> KeepResult<SqlExpr> {
        match expr {
            Expression::Column(id) => {
                let table = self
                    .algebra
                    .table(id.table())
                    .ok_or_else(|| KeepError::UnknownTable(self.algebra.describe(id.table())))?;
                Ok(SqlExpr::Column(SqlColumn::Table {
                    table: table.name().to_string(),
                    name: self.algebra.column(*id).name().to_string(),
                }))
            }
            Expression::Derived(id) => self.resolve_derived(*id),
            Expression::Literal(value) => {
                Ok(SqlExpr::Placeholder(self.shared.placeholders.add(value.clone())))
            }
            Expression::Aliased { expr, .. } => self.resolve_in_query(expr),
            Expression::Eq(left, right) => Ok(SqlExpr::Eq(
                Box::new(self.resolve_in_query(left)?),
                Box::new(self.resolve_in_query(right)?),
            )),
            Expression::Aggregate { func, arg } => Ok(SqlExpr::Aggregate {
                func: *func,
                arg: Box::new(self.resolve_in_query(arg)?),
            }),
        }
    }

    /// Memoized per derived column, so one column always renders the same
    /// way within a compile.
    fn resolve_derived(&mut self, id: DerivedId) -> KeepResult<SqlExpr> {
        if let Some(cached) = self.column_cache.get(&id) {
            return Ok(cached.clone());
        }
        let algebra = self.algebra;
        let derived = algebra.derived(id);
        let subquery = self
            .singular_ref_index
            .get(&derived.relation())
            .copied()
            .filter(|index| matches!(self.singular_refs[*index], SingularRef::Subquery { .. }));

        let resolved = match subquery {
            Some(index) => self.resolve_through_subquery(index, id)?,
            None => self.resolve_in_query(derived.ancestor())?,
        };
        self.column_cache.insert(id, resolved.clone());
        Ok(resolved)
    }

    fn resolve_through_subquery(&mut self, index: usize, id: DerivedId) -> KeepResult<SqlExpr> {
        let shared = &mut self.shared;
        let Some((alias, query)) = self.singular_refs[index].as_subquery_mut() else {
            return Err(KeepError::ColumnNotExposed(
                self.algebra.derived(id).name().to_string(),
            ));
        };
        std::mem::swap(shared, &mut query.shared);
        let name = query.exposed_name(id);
        std::mem::swap(shared, &mut query.shared);

        Ok(SqlExpr::Column(SqlColumn::Subquery {
            alias: alias.to_string(),
            name: name?,
        }))
    }

    /// Name under which this query's select list exposes `id`.
    fn exposed_name(&mut self, id: DerivedId) -> KeepResult<String> {
        let expr = self.resolve_derived(id)?;
        let exposed = match &self.select_list {
            Some(columns) => columns
                .iter()
                .find(|column| column.expr == expr)
                .map(|column| column.name.clone()),
            None => expr.bare_name().map(str::to_string),
        };
        exposed.ok_or_else(|| {
            KeepError::ColumnNotExposed(self.algebra.derived(id).name().to_string())
        })
    }

    /// Turn one flat result row into a tuple shaped like the relation.
    pub fn build_tuple(&self, row: &FieldValues) -> Tuple {
        match self.tuple_builder {
            Some(TupleBuilder::Projection) => {
                let names = self.select_list.iter().flatten().map(|c| c.name.as_str());
                Tuple::Record(Record::from_row(None, names, |name| name.to_string(), row))
            }
            Some(TupleBuilder::Table(table)) => Tuple::Record(self.table_record(table, None, row)),
            None => match &self.table_ref {
                Some(TableRef::Singular(index)) => self.unit_tuple(*index, None, row),
                Some(join) => {
                    let mut components = Vec::new();
                    for index in join.units() {
                        self.collect_components(index, row, &mut components);
                    }
                    Tuple::Composite(components)
                }
                None => Tuple::Record(Record::default()),
            },
        }
    }

    fn unit_tuple(&self, index: usize, prefix: Option<&str>, row: &FieldValues) -> Tuple {
        match &self.singular_refs[index] {
            SingularRef::Table { relation, .. } => {
                Tuple::Record(self.table_record(*relation, prefix, row))
            }
            SingularRef::Subquery { alias, query, .. } => {
                let prefix = qualify(alias, "");
                let stripped: FieldValues = row
                    .iter()
                    .filter_map(|(name, value)| {
                        name.strip_prefix(&prefix)
                            .map(|field| (field.to_string(), value.clone()))
                    })
                    .collect();
                query.build_tuple(&stripped)
            }
        }
    }

    /// A unit inside a join reads its fields under its qualifier.
    fn collect_components(
        &self,
        index: usize,
        row: &FieldValues,
        components: &mut Vec<(String, Option<Record>)>,
    ) {
        let unit = &self.singular_refs[index];
        match self.unit_tuple(index, Some(unit.qualifier()), row) {
            Tuple::Record(record) => {
                let key = record
                    .table()
                    .unwrap_or_else(|| unit.qualifier())
                    .to_string();
                let record = (!record.is_all_null()).then_some(record);
                components.push((key, record));
            }
            Tuple::Composite(nested) => components.extend(nested),
        }
    }

    fn table_record(&self, table: RelationId, prefix: Option<&str>, row: &FieldValues) -> Record {
        let Some(table) = self.algebra.table(table) else {
            return Record::default();
        };
        Record::from_row(
            Some(table.name()),
            table.columns().iter().map(|c| c.name()),
            |name| match prefix {
                Some(prefix) => qualify(prefix, name),
                None => name.to_string(),
            },
            row,
        )
    }
}
