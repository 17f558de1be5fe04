use super::{Algebra, DerivedId, RelationId};
use crate::ast::{col, Expr, QUALIFIER_DELIMITER};
use crate::error::{KeepError, KeepResult};

/// A record type backed by a table.
pub trait TableRecord {
    const TABLE: &'static str;
}

/// One argument to a projection.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectArg {
    /// A table in the arena.
    Table(RelationId),
    /// A record type's declared table.
    Record(&'static str),
    /// A bare name: a table name when it is the only argument and names a
    /// reachable table, otherwise a column.
    Name(String),
    /// An explicit column expression.
    Expr(Expr),
}

impl ProjectArg {
    pub fn record<R: TableRecord>() -> Self {
        ProjectArg::Record(R::TABLE)
    }

    pub(crate) fn into_column_expr(self) -> KeepResult<Expr> {
        match self {
            ProjectArg::Name(name) => Ok(col(name)),
            ProjectArg::Expr(expr) => Ok(expr),
            ProjectArg::Table(_) | ProjectArg::Record(_) => Err(KeepError::InvalidProjection(
                "a table can only be projected on its own".to_string(),
            )),
        }
    }
}

impl From<&str> for ProjectArg {
    fn from(name: &str) -> Self {
        ProjectArg::Name(name.to_string())
    }
}

impl From<String> for ProjectArg {
    fn from(name: String) -> Self {
        ProjectArg::Name(name)
    }
}

impl From<Expr> for ProjectArg {
    fn from(expr: Expr) -> Self {
        ProjectArg::Expr(expr)
    }
}

impl From<RelationId> for ProjectArg {
    fn from(table: RelationId) -> Self {
        ProjectArg::Table(table)
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    operand: RelationId,
    projected_table: Option<RelationId>,
    projected_columns: Vec<DerivedId>,
}

impl Projection {
    pub(crate) fn table_projection(operand: RelationId, table: RelationId) -> Self {
        Self {
            operand,
            projected_table: Some(table),
            projected_columns: Vec::new(),
        }
    }

    pub(crate) fn column_projection(
        operand: RelationId,
        projected_columns: Vec<DerivedId>,
    ) -> Self {
        Self {
            operand,
            projected_table: None,
            projected_columns,
        }
    }

    pub fn operand(&self) -> RelationId {
        self.operand
    }

    /// The table whose columns this projection passes through, if it is a
    /// table projection.
    pub fn projected_table(&self) -> Option<RelationId> {
        self.projected_table
    }

    pub fn projected_columns(&self) -> &[DerivedId] {
        &self.projected_columns
    }

    pub fn is_table_projection(&self) -> bool {
        self.projected_table.is_some()
    }
}

impl Algebra {
    /// A projection is a table projection when it has exactly one argument
    /// and that argument names a table the operand can reach.
    pub(crate) fn detect_projected_table(
        &self,
        operand: RelationId,
        args: &[ProjectArg],
    ) -> Option<RelationId> {
        let [arg] = args else {
            return None;
        };
        let table_name: &str = match arg {
            ProjectArg::Table(id) => self.table(*id)?.name(),
            ProjectArg::Record(table) => *table,
            ProjectArg::Name(name) if !name.contains(QUALIFIER_DELIMITER) => name.as_str(),
            ProjectArg::Name(_) | ProjectArg::Expr(_) => return None,
        };
        self.get_table(operand, table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{qualify, ColumnType, Expression};
    use crate::relation::Relation;
    use pretty_assertions::assert_eq;

    struct Post;

    impl TableRecord for Post {
        const TABLE: &'static str = "posts";
    }

    fn schema() -> (Algebra, RelationId, RelationId, RelationId) {
        let mut algebra = Algebra::new();
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
        let join = algebra
            .left_join(posts, comments, [(qualify("posts", "id"), col("post_id"))])
            .unwrap();
        (algebra, posts, comments, join)
    }

    fn projection(algebra: &Algebra, id: RelationId) -> &Projection {
        match algebra.get(id) {
            Relation::Projection(p) => p,
            other => panic!("expected a projection, got {}", other.kind()),
        }
    }

    #[test]
    fn test_table_projection_detection() {
        let (mut algebra, posts, _, join) = schema();

        for arg in [
            ProjectArg::Table(posts),
            ProjectArg::record::<Post>(),
            ProjectArg::from("posts"),
        ] {
            let id = algebra.projection(join, [arg]).unwrap();
            assert_eq!(projection(&algebra, id).projected_table(), Some(posts));
            assert_eq!(algebra.column_names(id), vec!["id", "blog_id", "title"]);
        }
    }

    #[test]
    fn test_table_projection_passes_through_operand_columns() {
        let (mut algebra, posts, _, join) = schema();
        let id = algebra.projection(join, [posts]).unwrap();

        for (dc, name) in algebra.columns(id).iter().zip(["id", "blog_id", "title"]) {
            let derived = algebra.derived(*dc);
            assert_eq!(derived.alias(), Some(name));
            let expected = algebra.get_column(join, &qualify("posts", name)).unwrap();
            assert_eq!(derived.ancestor(), &Expression::Derived(expected));
        }
        assert_eq!(algebra.get_table(id, "posts"), Some(posts));
        assert_eq!(algebra.get_table(id, "comments"), None);
    }

    #[test]
    fn test_other_shapes_are_column_projections() {
        let (mut algebra, _, _, join) = schema();

        let qualified = algebra.projection(join, ["posts__title"]).unwrap();
        assert!(!projection(&algebra, qualified).is_table_projection());
        assert_eq!(algebra.column_names(qualified), vec!["title"]);

        let several = algebra.projection(join, ["body", "post_id"]).unwrap();
        assert_eq!(projection(&algebra, several).projected_columns().len(), 2);
        assert_eq!(algebra.column_names(several), vec!["body", "post_id"]);
        assert_eq!(algebra.get_table(several, "comments"), None);
    }

    #[test]
    fn test_unreachable_table_name_is_a_column() {
        let mut algebra = Algebra::new();
        let blogs = algebra
            .create_table(
                "blogs",
                [("id", ColumnType::Integer), ("posts", ColumnType::Integer)],
            )
            .unwrap();
        let _posts = algebra
            .create_table("posts", [("id", ColumnType::Integer)])
            .unwrap();

        let id = algebra.projection(blogs, ["posts"]).unwrap();
        assert!(!projection(&algebra, id).is_table_projection());
        assert_eq!(algebra.column_names(id), vec!["posts"]);
    }

    #[test]
    fn test_projection_changes_name_space() {
        let (mut algebra, _, _, join) = schema();
        let id = algebra
            .projection(join, [col("posts__title").alias("headline")])
            .unwrap();

        assert!(algebra.get_column(id, "headline").is_some());
        assert!(algebra.get_column(id, "title").is_none());
        assert_eq!(
            algebra.get_column(id, "posts__title"),
            algebra.get_column(id, "headline")
        );
        assert!(algebra.get_column(id, "posts__blog_id").is_none());
    }

    #[test]
    fn test_table_handle_in_column_list() {
        let (mut algebra, posts, comments, join) = schema();
        let err = algebra
            .projection(join, [ProjectArg::Table(posts), ProjectArg::Table(comments)])
            .unwrap_err();
        assert!(matches!(err, KeepError::InvalidProjection(_)));
    }

    #[test]
    fn test_duplicate_output_names() {
        let (mut algebra, _, _, join) = schema();
        let err = algebra
            .projection(join, ["posts__id", "comments__id"])
            .unwrap_err();
        assert!(matches!(err, KeepError::InvalidProjection(_)));

        let id = algebra
            .projection(join, [col("posts__id"), col("comments__id").alias("comment_id")])
            .unwrap();
        assert_eq!(algebra.column_names(id), vec!["id", "comment_id"]);
        assert_ne!(
            algebra.get_column(id, "posts__id"),
            algebra.get_column(id, "comments__id")
        );
    }

    #[test]
    fn test_same_column_twice_is_one_column() {
        let (mut algebra, _, _, join) = schema();
        let id = algebra.projection(join, ["posts__title", "title"]).unwrap();
        assert_eq!(algebra.column_names(id), vec!["title"]);
        assert_eq!(projection(&algebra, id).projected_columns().len(), 1);
    }

    #[test]
    fn test_empty_projection() {
        let (mut algebra, _, _, join) = schema();
        let err = algebra.projection(join, Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, KeepError::InvalidProjection(_)));
    }

    #[test]
    fn test_aggregate_projection() {
        let (mut algebra, posts, _, _) = schema();
        let id = algebra.projection(posts, [col("id").count()]).unwrap();
        assert_eq!(algebra.column_names(id), vec!["count"]);

        let err = algebra.projection(posts, [crate::ast::lit(1)]).unwrap_err();
        assert!(matches!(err, KeepError::InvalidProjection(_)));
    }
}
