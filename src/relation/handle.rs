use super::{Algebra, JoinKind, ProjectArg, RelationId};
use crate::ast::{ToPredicate, Value};
use crate::error::KeepResult;

/// Fluent composition over an [`Algebra`].
///
/// ```
/// use keep::prelude::*;
///
/// let mut algebra = Algebra::new();
/// let blogs = algebra
///     .create_table("blogs", [("id", ColumnType::Integer), ("user_id", ColumnType::Integer)])
///     .unwrap();
/// let mine = algebra.relation(blogs).filter([("user_id", 1)]).unwrap().id();
///
/// let (sql, placeholders) = algebra.to_sql(mine).unwrap();
/// assert_eq!(sql, "SELECT * FROM blogs WHERE blogs.user_id = :v1");
/// assert_eq!(placeholders.get("v1"), Some(&Value::Integer(1)));
/// ```
pub struct RelationHandle<'a> {
    algebra: &'a mut Algebra,
    id: RelationId,
}

impl<'a> RelationHandle<'a> {
    pub(crate) fn new(algebra: &'a mut Algebra, id: RelationId) -> Self {
        Self { algebra, id }
    }

    pub fn id(&self) -> RelationId {
        self.id
    }

    fn then(self, id: RelationId) -> Self {
        Self {
            algebra: self.algebra,
            id,
        }
    }

    pub fn filter(self, predicate: impl ToPredicate) -> KeepResult<Self> {
        let id = self.algebra.selection(self.id, predicate)?;
        Ok(self.then(id))
    }

    /// Filter on `id = <id>`.
    pub fn find(self, id: impl Into<Value>) -> KeepResult<Self> {
        self.filter([("id", id.into())])
    }

    pub fn project<A, I>(self, args: I) -> KeepResult<Self>
    where
        A: Into<ProjectArg>,
        I: IntoIterator<Item = A>,
    {
        let id = self.algebra.projection(self.id, args)?;
        Ok(self.then(id))
    }

    pub fn join(self, right: RelationId, predicate: impl ToPredicate) -> KeepResult<Self> {
        let id = self.algebra.inner_join(self.id, right, predicate)?;
        Ok(self.then(id))
    }

    pub fn left_join(self, right: RelationId, predicate: impl ToPredicate) -> KeepResult<Self> {
        let id = self.algebra.left_join(self.id, right, predicate)?;
        Ok(self.then(id))
    }

    /// Inner join on an inferred foreign key.
    pub fn join_inferred(self, right: RelationId) -> KeepResult<Self> {
        let id = self.algebra.join_inferred(JoinKind::Inner, self.id, right)?;
        Ok(self.then(id))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chained_composition() {
        let mut algebra = Algebra::new();
        let blogs = algebra
            .create_table("blogs", [("id", ColumnType::Integer), ("user_id", ColumnType::Integer)])
            .unwrap();
        let posts = algebra
            .create_table("posts", [("id", ColumnType::Integer), ("blog_id", ColumnType::Integer)])
            .unwrap();

        let chained = algebra
            .relation(blogs)
            .filter([("user_id", 1)])
            .unwrap()
            .join_inferred(posts)
            .unwrap()
            .project([posts])
            .unwrap()
            .id();

        let mine = algebra.selection(blogs, [("user_id", 1)]).unwrap();
        let join = algebra.join_inferred(JoinKind::Inner, mine, posts).unwrap();
        let direct = algebra.projection(join, [posts]).unwrap();

        assert!(algebra.relations_equal(chained, direct));
        assert_eq!(algebra.to_sql(chained).unwrap(), algebra.to_sql(direct).unwrap());
    }

    #[test]
    fn test_find_filters_on_id() {
        let mut algebra = Algebra::new();
        let blogs = algebra.create_table("blogs", [("id", ColumnType::Integer)]).unwrap();

        let found = algebra.relation(blogs).find(7).unwrap().id();
        let (sql, placeholders) = algebra.to_sql(found).unwrap();
        assert_eq!(sql, "SELECT * FROM blogs WHERE blogs.id = :v1");
        assert_eq!(placeholders.get("v1"), Some(&Value::Integer(7)));
    }
}
