use super::blogging;
use crate::ast::{col, qualify};
use crate::error::KeepError;
use crate::transpiler::{QueryBuilder, TableRef};
use pretty_assertions::assert_eq;

#[test]
fn test_compiles_are_deterministic() {
    let mut b = blogging();
    let mine = b.algebra.selection(b.blogs, [("user_id", 1)]).unwrap();
    let posts_comments = b
        .algebra
        .left_join(b.posts, b.comments, [(qualify("posts", "id"), col("post_id"))])
        .unwrap();
    let join = b
        .algebra
        .left_join(mine, posts_comments, [(qualify("blogs", "id"), col("blog_id"))])
        .unwrap();

    let first = b.algebra.to_sql(join).unwrap();
    let second = b.algebra.to_sql(join).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_compiles_share_the_tree() {
    let mut b = blogging();
    let mine = b.algebra.selection(b.blogs, [("user_id", 7)]).unwrap();
    let join = b
        .algebra
        .left_join(mine, b.posts, [(qualify("blogs", "id"), col("blog_id"))])
        .unwrap();
    let expected = b.algebra.to_sql(join).unwrap();

    let algebra = &b.algebra;
    let compiled: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || algebra.to_sql(join).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for result in compiled {
        assert_eq!(result, expected);
    }
}

#[test]
fn test_second_table_ref_is_rejected() {
    let b = blogging();
    let mut query = QueryBuilder::build(&b.algebra, b.blogs).unwrap();
    assert!(matches!(query.table_ref(), Some(TableRef::Singular(0))));

    let err = query.set_table_ref(TableRef::Singular(0)).unwrap_err();
    assert!(matches!(err, KeepError::TableRefAlreadyAssigned));
}

#[test]
fn test_builder_parts() {
    let mut b = blogging();
    let mine = b.algebra.selection(b.blogs, [("user_id", 1)]).unwrap();
    let titled = b.algebra.selection(mine, [("title", "x")]).unwrap();

    let query = b.algebra.query(titled).unwrap();
    assert_eq!(query.relation(), titled);
    assert!(query.select_list().is_none());
    assert_eq!(query.conditions().len(), 2);
    assert_eq!(query.singular_refs().len(), 1);
    assert_eq!(query.placeholders().len(), 2);
}
