//! # keep: relational algebra that compiles to SQL
//!
//! Compose tables, selections, projections and joins as a tree, then compile
//! the whole tree into one parameterized `SELECT`. Columns keep their identity
//! through any depth of nesting: a name written against one relation resolves,
//! through every selection, projection, join and subquery in between, to the
//! physical column it reads.
//!
//! ## Quick Example
//!
//! ```
//! use keep::prelude::*;
//!
//! let mut algebra = Algebra::new();
//! let blogs = algebra
//!     .create_table("blogs", [("id", ColumnType::Integer), ("user_id", ColumnType::Integer)])
//!     .unwrap();
//! let posts = algebra
//!     .create_table("posts", [("id", ColumnType::Integer), ("blog_id", ColumnType::Integer)])
//!     .unwrap();
//!
//! let mine = algebra.selection(blogs, [("user_id", 1)]).unwrap();
//! let join = algebra
//!     .left_join(mine, posts, [(qualify("blogs", "id"), col("blog_id"))])
//!     .unwrap();
//!
//! let (sql, placeholders) = algebra.to_sql(join).unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT t1.id AS t1__id, t1.user_id AS t1__user_id, \
//!      posts.id AS posts__id, posts.blog_id AS posts__blog_id \
//!      FROM (SELECT * FROM blogs WHERE blogs.user_id = :v1) AS t1 \
//!      LEFT OUTER JOIN posts ON t1.id = posts.blog_id"
//! );
//! assert_eq!(placeholders.get("v1"), Some(&Value::Integer(1)));
//! ```
//!
//! ## Naming
//!
//! | Form            | Meaning                                   |
//! |-----------------|-------------------------------------------|
//! | `title`         | First operand exposing `title` wins       |
//! | `blogs__title`  | `title` of the `blogs` table              |
//! | `t1__title`     | `title` as exposed by subquery `t1`       |
//! | `:v1`           | Placeholder for the first literal         |

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod relation;
pub mod schema;
pub mod transpiler;
pub mod tuple;
pub mod wire;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::KeepConfig;
    pub use crate::engine::Database;
    pub use crate::error::*;
    pub use crate::relation::{
        Algebra, JoinKind, ProjectArg, Relation, RelationHandle, RelationId, TableRecord,
    };
    pub use crate::schema::SchemaConfig;
    pub use crate::transpiler::{Placeholders, QueryBuilder, ToSql};
    pub use crate::tuple::{FieldValues, Record, Tuple};
}
