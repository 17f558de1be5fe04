use crate::ast::Value;
use crate::error::{KeepError, KeepResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Separates a qualifier from a field in a column name (`blogs__id`).
pub const QUALIFIER_DELIMITER: &str = "__";

/// Build a qualified column name: `qualify("blogs", "id")` is `blogs__id`.
pub fn qualify(table: &str, column: &str) -> String {
    format!("{}{}{}", table, QUALIFIER_DELIMITER, column)
}

/// Split a qualified name into `(qualifier, field)`.
///
/// The split happens at the last delimiter so `t2__posts__id` yields
/// `("t2__posts", "id")`.
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once(QUALIFIER_DELIMITER)
        .filter(|(qualifier, field)| !qualifier.is_empty() && !field.is_empty())
}

/// Aggregate functions usable in projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    /// Default output name of an unaliased aggregate column.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        }
    }
}

impl std::fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateFunc::Count => write!(f, "COUNT"),
            AggregateFunc::Sum => write!(f, "SUM"),
            AggregateFunc::Avg => write!(f, "AVG"),
            AggregateFunc::Min => write!(f, "MIN"),
            AggregateFunc::Max => write!(f, "MAX"),
        }
    }
}

/// An unresolved expression, written against names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Column reference, unqualified (`title`) or qualified (`blogs__title`).
    Column(String),
    Literal(Value),
    /// Expression exposed under another name.
    Aliased { expr: Box<Expr>, alias: String },
    Eq(Box<Expr>, Box<Expr>),
    Aggregate { func: AggregateFunc, arg: Box<Expr> },
}

/// Reference a column by name.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A literal value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    /// Equality predicate `self = other`.
    pub fn eq(self, other: impl Into<Expr>) -> Expr {
        Expr::Eq(Box::new(self), Box::new(other.into()))
    }

    /// Expose this expression as `alias`.
    pub fn alias(self, alias: impl Into<String>) -> Expr {
        Expr::Aliased {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    pub fn count(self) -> Expr {
        self.aggregate(AggregateFunc::Count)
    }

    pub fn sum(self) -> Expr {
        self.aggregate(AggregateFunc::Sum)
    }

    pub fn min(self) -> Expr {
        self.aggregate(AggregateFunc::Min)
    }

    pub fn max(self) -> Expr {
        self.aggregate(AggregateFunc::Max)
    }

    fn aggregate(self, func: AggregateFunc) -> Expr {
        Expr::Aggregate {
            func,
            arg: Box::new(self),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Aliased { expr, alias } => write!(f, "{} AS {}", expr, alias),
            Expr::Eq(left, right) => write!(f, "{} = {}", left, right),
            Expr::Aggregate { func, arg } => write!(f, "{}({})", func, arg),
        }
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Literal(n.into())
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Literal(n.into())
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Literal(b.into())
    }
}

/// Text converts to a literal; use [`col`] for column references.
impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(s.into())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(s.into())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Expr {
    fn from(ts: chrono::DateTime<chrono::Utc>) -> Self {
        Expr::Literal(ts.into())
    }
}

/// Anything that can denote a single equality predicate.
///
/// Field/value collections are read as `name = value` and must hold exactly
/// one entry.
pub trait ToPredicate {
    fn to_predicate(self) -> KeepResult<Expr>;
}

impl ToPredicate for Expr {
    fn to_predicate(self) -> KeepResult<Expr> {
        match self {
            Expr::Eq(..) => Ok(self),
            _ => Err(KeepError::UnsupportedPredicate { entries: 0 }),
        }
    }
}

fn single_pair<K, V, I>(pairs: I) -> KeepResult<Expr>
where
    K: Into<String>,
    V: Into<Expr>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut pairs: Vec<(K, V)> = pairs.into_iter().collect();
    if pairs.len() != 1 {
        return Err(KeepError::UnsupportedPredicate {
            entries: pairs.len(),
        });
    }
    let (name, value) = pairs.remove(0);
    Ok(col(name).eq(value))
}

impl<K: Into<String>, V: Into<Expr>, const N: usize> ToPredicate for [(K, V); N] {
    fn to_predicate(self) -> KeepResult<Expr> {
        single_pair(self)
    }
}

impl<K: Into<String>, V: Into<Expr>> ToPredicate for Vec<(K, V)> {
    fn to_predicate(self) -> KeepResult<Expr> {
        single_pair(self)
    }
}

impl<K: Into<String>, V: Into<Expr>> ToPredicate for HashMap<K, V> {
    fn to_predicate(self) -> KeepResult<Expr> {
        single_pair(self)
    }
}

impl<K: Into<String>, V: Into<Expr>> ToPredicate for BTreeMap<K, V> {
    fn to_predicate(self) -> KeepResult<Expr> {
        single_pair(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("blogs__user_id"), Some(("blogs", "user_id")));
        assert_eq!(split_qualified("t2__posts__id"), Some(("t2__posts", "id")));
        assert_eq!(split_qualified("user_id"), None);
        assert_eq!(split_qualified("__id"), None);
    }

    #[test]
    fn test_pair_predicate() {
        let pred = [("user_id", 1)].to_predicate().unwrap();
        assert_eq!(pred, col("user_id").eq(1));

        let pred = [(qualify("blogs", "id"), col("blog_id"))].to_predicate().unwrap();
        assert_eq!(pred.to_string(), "blogs__id = blog_id");
    }

    #[test]
    fn test_pair_predicate_shape() {
        let empty: Vec<(&str, i64)> = vec![];
        assert!(matches!(
            empty.to_predicate(),
            Err(KeepError::UnsupportedPredicate { entries: 0 })
        ));
        assert!(matches!(
            vec![("a", 1), ("b", 2)].to_predicate(),
            Err(KeepError::UnsupportedPredicate { entries: 2 })
        ));
        assert!(col("title").to_predicate().is_err());
    }
}
