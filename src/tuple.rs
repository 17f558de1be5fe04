//! Tuples built from flat result rows.
//!
//! A compiled query knows the shape of its relation. Given one row as a
//! `name -> value` map it builds either a single [`Record`] or, for joins,
//! one optional record per joined unit.

use crate::ast::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// One result row, keyed by select-list name.
pub type FieldValues = HashMap<String, Value>;

/// Ordered fields, plus the table the shape came from when there is one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    table: Option<String>,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(table: Option<String>, fields: Vec<(String, Value)>) -> Self {
        Self { table, fields }
    }

    /// Pick `names` out of `row`, reading each under `key(name)`. Missing
    /// fields are null.
    pub(crate) fn from_row<'n>(
        table: Option<&str>,
        names: impl IntoIterator<Item = &'n str>,
        key: impl Fn(&str) -> String,
        row: &FieldValues,
    ) -> Self {
        let fields = names
            .into_iter()
            .map(|name| {
                let value = row.get(&key(name)).cloned().unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect();
        Self {
            table: table.map(str::to_string),
            fields,
        }
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// True for the right side of an unmatched left join row.
    pub fn is_all_null(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_null())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &value.to_json())?;
        }
        map.end()
    }
}

/// A row shaped like its relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Tuple {
    Record(Record),
    /// One entry per joined unit, keyed by table name or subquery alias.
    Composite(Vec<(String, Option<Record>)>),
}

impl Tuple {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Tuple::Record(record) => Some(record),
            Tuple::Composite(_) => None,
        }
    }

    /// A joined component. `None` when there is no such component or when it
    /// had no matching row.
    pub fn component(&self, key: &str) -> Option<&Record> {
        match self {
            Tuple::Record(record) => (record.table() == Some(key)).then_some(record),
            Tuple::Composite(components) => components
                .iter()
                .find(|(name, _)| name == key)
                .and_then(|(_, record)| record.as_ref()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Tuple::Record(record) => record.to_json(),
            Tuple::Composite(components) => serde_json::Value::Object(
                components
                    .iter()
                    .map(|(name, record)| {
                        let json = record
                            .as_ref()
                            .map(Record::to_json)
                            .unwrap_or(serde_json::Value::Null);
                        (name.clone(), json)
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, qualify, ColumnType};
    use crate::relation::Algebra;
    use pretty_assertions::assert_eq;

    fn row(fields: &[(&str, Value)]) -> FieldValues {
        fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn blogs_posts() -> (Algebra, crate::relation::RelationId, crate::relation::RelationId) {
        let mut algebra = Algebra::new();
        let blogs = algebra
            .create_table(
                "blogs",
                [("id", ColumnType::Integer), ("user_id", ColumnType::Integer)],
            )
            .unwrap();
        let posts = algebra
            .create_table(
                "posts",
                [
                    ("id", ColumnType::Integer),
                    ("blog_id", ColumnType::Integer),
                    ("title", ColumnType::String),
                ],
            )
            .unwrap();
        (algebra, blogs, posts)
    }

    #[test]
    fn test_table_row_is_a_record() {
        let (mut algebra, blogs, _) = blogs_posts();
        let selection = algebra.selection(blogs, [("user_id", 1)]).unwrap();
        let query = algebra.query(selection).unwrap();

        let tuple = query.build_tuple(&row(&[("id", 3.into()), ("user_id", 1.into())]));
        let record = tuple.as_record().unwrap();
        assert_eq!(record.table(), Some("blogs"));
        assert_eq!(record.get("id"), Some(&Value::Integer(3)));
        assert_eq!(record.to_json(), serde_json::json!({"id": 3, "user_id": 1}));
    }

    #[test]
    fn test_unmatched_left_join_side_is_none() {
        let (mut algebra, blogs, posts) = blogs_posts();
        let join = algebra
            .left_join(blogs, posts, [(qualify("blogs", "id"), col("blog_id"))])
            .unwrap();
        let query = algebra.query(join).unwrap();

        let tuple = query.build_tuple(&row(&[
            ("blogs__id", 1.into()),
            ("blogs__user_id", 1.into()),
            ("posts__id", Value::Null),
            ("posts__blog_id", Value::Null),
            ("posts__title", Value::Null),
        ]));
        assert_eq!(
            tuple.component("blogs").and_then(|r| r.get("id")),
            Some(&Value::Integer(1))
        );
        assert_eq!(tuple.component("posts"), None);
        assert_eq!(
            tuple.to_json(),
            serde_json::json!({"blogs": {"id": 1, "user_id": 1}, "posts": null})
        );
    }

    #[test]
    fn test_subquery_fields_are_unprefixed() {
        let (mut algebra, blogs, posts) = blogs_posts();
        let mine = algebra.selection(blogs, [("user_id", 1)]).unwrap();
        let join = algebra
            .left_join(mine, posts, [(qualify("blogs", "id"), col("blog_id"))])
            .unwrap();
        let query = algebra.query(join).unwrap();

        let tuple = query.build_tuple(&row(&[
            ("t1__id", 1.into()),
            ("t1__user_id", 1.into()),
            ("posts__id", 2.into()),
            ("posts__blog_id", 1.into()),
            ("posts__title", "Hello".into()),
        ]));
        match tuple {
            Tuple::Composite(components) => {
                let keys: Vec<&str> = components.iter().map(|(key, _)| key.as_str()).collect();
                assert_eq!(keys, vec!["blogs", "posts"]);
                assert_eq!(
                    components[1].1.as_ref().and_then(|r| r.get("title")),
                    Some(&Value::from("Hello"))
                );
            }
            other => panic!("expected a composite tuple, got {:?}", other),
        }
    }

    #[test]
    fn test_column_projection_record() {
        let (mut algebra, _, posts) = blogs_posts();
        let titles = algebra
            .projection(posts, [col("title").alias("headline")])
            .unwrap();
        let query = algebra.query(titles).unwrap();

        let tuple = query.build_tuple(&row(&[("headline", "Hi".into())]));
        let record = tuple.as_record().unwrap();
        assert_eq!(record.table(), None);
        assert_eq!(record.fields(), &[("headline".to_string(), Value::from("Hi"))]);
    }
}
