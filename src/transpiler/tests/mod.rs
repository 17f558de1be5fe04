mod query;
mod selection;

use crate::ast::ColumnType;
use crate::relation::{Algebra, RelationId};

/// blogs, posts and comments.
pub(super) struct Blogging {
    pub algebra: Algebra,
    pub blogs: RelationId,
    pub posts: RelationId,
    pub comments: RelationId,
}

pub(super) fn blogging() -> Blogging {
    let mut algebra = Algebra::new();
    let blogs = algebra
        .create_table(
            "blogs",
            [
                ("id", ColumnType::Integer),
                ("user_id", ColumnType::Integer),
                ("title", ColumnType::String),
            ],
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
    let comments = algebra
        .create_table(
            "comments",
            [
                ("id", ColumnType::Integer),
                ("post_id", ColumnType::Integer),
                ("body", ColumnType::String),
            ],
        )
        .unwrap();
    Blogging {
        algebra,
        blogs,
        posts,
        comments,
    }
}
