use super::blogging;
use crate::ast::{col, Value};
use crate::transpiler::Placeholders;
use pretty_assertions::assert_eq;

#[test]
fn test_table() {
    let b = blogging();
    let (sql, placeholders) = b.algebra.to_sql(b.blogs).unwrap();
    assert_eq!(sql, "SELECT * FROM blogs");
    assert!(placeholders.is_empty());
}

#[test]
fn test_selection_binds_literal() {
    let mut b = blogging();
    let mine = b.algebra.selection(b.blogs, [("user_id", 1)]).unwrap();

    let (sql, placeholders) = b.algebra.to_sql(mine).unwrap();
    assert_eq!(sql, "SELECT * FROM blogs WHERE blogs.user_id = :v1");
    assert_eq!(placeholders, Placeholders::from([("v1", Value::Integer(1))]));
}

#[test]
fn test_nested_selections_are_conjoined() {
    let mut b = blogging();
    let mine = b.algebra.selection(b.blogs, [("user_id", 1)]).unwrap();
    let titled = b.algebra.selection(mine, [("title", "Blog 1")]).unwrap();

    let (sql, placeholders) = b.algebra.to_sql(titled).unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM blogs WHERE blogs.user_id = :v1 AND blogs.title = :v2"
    );
    assert_eq!(
        placeholders,
        Placeholders::from([("v1", Value::Integer(1)), ("v2", Value::from("Blog 1"))])
    );
}

#[test]
fn test_equal_literals_get_their_own_placeholders() {
    let mut b = blogging();
    let first = b.algebra.selection(b.blogs, [("user_id", 1)]).unwrap();
    let second = b.algebra.selection(first, [("id", 1)]).unwrap();

    let (sql, placeholders) = b.algebra.to_sql(second).unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM blogs WHERE blogs.user_id = :v1 AND blogs.id = :v2"
    );
    assert_eq!(placeholders.len(), 2);
}

#[test]
fn test_column_to_column_predicate() {
    let mut b = blogging();
    let own = b
        .algebra
        .selection(b.blogs, col("id").eq(col("user_id")))
        .unwrap();

    let (sql, placeholders) = b.algebra.to_sql(own).unwrap();
    assert_eq!(sql, "SELECT * FROM blogs WHERE blogs.id = blogs.user_id");
    assert!(placeholders.is_empty());
}

#[test]
fn test_null_literal() {
    let mut b = blogging();
    let orphaned = b
        .algebra
        .selection(b.blogs, [("user_id", Value::Null)])
        .unwrap();

    let (sql, placeholders) = b.algebra.to_sql(orphaned).unwrap();
    assert_eq!(sql, "SELECT * FROM blogs WHERE blogs.user_id = :v1");
    assert_eq!(placeholders.get("v1"), Some(&Value::Null));
}
