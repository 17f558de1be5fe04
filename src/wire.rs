//! JSON wire representation of relation trees.
//!
//! Every node carries a `type` tag. Columns travel as `{table, name}` pairs
//! naming the physical column they read, so a tree can be rebuilt against
//! any arena that declares the same tables.

use crate::ast::{col, lit, qualify, Expr, Expression, Value};
use crate::error::{KeepError, KeepResult};
use crate::relation::{Algebra, JoinKind, ProjectArg, Relation, RelationId};
use chrono::{DateTime, Utc};
use serde_json::{json, Value as Json};

/// Wire form of `id`. Only table projections are representable among
/// projections.
pub fn to_wire(algebra: &Algebra, id: RelationId) -> KeepResult<Json> {
    match algebra.get(id) {
        Relation::Table(table) => Ok(json!({
            "type": "table",
            "name": table.name(),
        })),
        Relation::Selection(selection) => Ok(json!({
            "type": "selection",
            "operand": to_wire(algebra, selection.operand())?,
            "predicate": expression_to_wire(algebra, selection.predicate())?,
        })),
        Relation::Join(join) => Ok(json!({
            "type": join_type(join.kind()),
            "left_operand": to_wire(algebra, join.left())?,
            "right_operand": to_wire(algebra, join.right())?,
            "predicate": expression_to_wire(algebra, join.predicate())?,
        })),
        Relation::Projection(projection) => {
            let table = projection
                .projected_table()
                .and_then(|table| algebra.table(table))
                .ok_or_else(|| KeepError::NotWireRepresentable(algebra.describe(id)))?;
            Ok(json!({
                "type": "table_projection",
                "operand": to_wire(algebra, projection.operand())?,
                "projected_table": table.name(),
            }))
        }
    }
}

fn join_type(kind: JoinKind) -> &'static str {
    match kind {
        JoinKind::Inner => "inner_join",
        JoinKind::LeftOuter => "left_join",
    }
}

fn expression_to_wire(algebra: &Algebra, expr: &Expression) -> KeepResult<Json> {
    match expr {
        Expression::Eq(left, right) => Ok(json!({
            "type": "eq",
            "left_operand": expression_to_wire(algebra, left)?,
            "right_operand": expression_to_wire(algebra, right)?,
        })),
        Expression::Column(_) | Expression::Derived(_) => {
            let column = algebra
                .physical_column(expr)
                .ok_or_else(|| KeepError::wire("only physical columns can be sent"))?;
            let table = algebra
                .table(column.table())
                .ok_or_else(|| KeepError::wire("column of a non-table relation"))?;
            Ok(json!({
                "type": "column",
                "table": table.name(),
                "name": algebra.column(column).name(),
            }))
        }
        Expression::Literal(Value::Timestamp(ts)) => Ok(json!({
            "type": "scalar",
            "kind": "timestamp",
            "value": ts.to_rfc3339(),
        })),
        Expression::Literal(value) => Ok(json!({
            "type": "scalar",
            "value": value.to_json(),
        })),
        Expression::Aliased { expr, .. } => expression_to_wire(algebra, expr),
        Expression::Aggregate { func, .. } => Err(KeepError::wire(format!(
            "aggregate {} has no wire form",
            func
        ))),
    }
}

/// Rebuild a relation from its wire form, against tables already declared
/// in `algebra`.
pub fn from_wire(algebra: &mut Algebra, json: &Json) -> KeepResult<RelationId> {
    match type_tag(json)? {
        "table" => {
            let name = str_field(json, "name")?;
            algebra
                .table_named(name)
                .ok_or_else(|| KeepError::wire(format!("unknown table '{}'", name)))
        }
        "selection" => {
            let operand = from_wire(algebra, field(json, "operand")?)?;
            let predicate = expression_from_wire(field(json, "predicate")?)?;
            algebra.selection(operand, predicate)
        }
        kind @ ("inner_join" | "left_join") => {
            let left = from_wire(algebra, field(json, "left_operand")?)?;
            let right = from_wire(algebra, field(json, "right_operand")?)?;
            let predicate = expression_from_wire(field(json, "predicate")?)?;
            let kind = if kind == "inner_join" {
                JoinKind::Inner
            } else {
                JoinKind::LeftOuter
            };
            algebra.join(kind, left, right, predicate)
        }
        "table_projection" => {
            let operand = from_wire(algebra, field(json, "operand")?)?;
            let name = str_field(json, "projected_table")?;
            let table = algebra
                .table_named(name)
                .ok_or_else(|| KeepError::wire(format!("unknown table '{}'", name)))?;
            algebra.projection(operand, [ProjectArg::Table(table)])
        }
        other => Err(KeepError::wire(format!("unknown relation type '{}'", other))),
    }
}

fn expression_from_wire(json: &Json) -> KeepResult<Expr> {
    match type_tag(json)? {
        "eq" => Ok(expression_from_wire(field(json, "left_operand")?)?
            .eq(expression_from_wire(field(json, "right_operand")?)?)),
        "column" => Ok(col(qualify(str_field(json, "table")?, str_field(json, "name")?))),
        "scalar" => scalar_from_wire(json).map(lit),
        other => Err(KeepError::wire(format!("unknown expression type '{}'", other))),
    }
}

/// Plain JSON scalars, plus `kind: "timestamp"` for RFC 3339 text.
fn scalar_from_wire(json: &Json) -> KeepResult<Value> {
    match json.get("kind").and_then(Json::as_str) {
        None => Value::from_json(field(json, "value")?),
        Some("timestamp") => {
            let text = str_field(json, "value")?;
            DateTime::parse_from_rfc3339(text)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| KeepError::wire(format!("bad timestamp '{}': {}", text, e)))
        }
        Some(other) => Err(KeepError::wire(format!("unknown scalar kind '{}'", other))),
    }
}

fn field<'j>(json: &'j Json, key: &str) -> KeepResult<&'j Json> {
    json.get(key)
        .ok_or_else(|| KeepError::wire(format!("missing field '{}'", key)))
}

fn str_field<'j>(json: &'j Json, key: &str) -> KeepResult<&'j str> {
    field(json, key)?
        .as_str()
        .ok_or_else(|| KeepError::wire(format!("field '{}' is not a string", key)))
}

fn type_tag(json: &Json) -> KeepResult<&str> {
    str_field(json, "type")
}
