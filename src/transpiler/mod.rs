//! SQL emission for relation trees.
//!
//! A [`QueryBuilder`] visits a relation once, collecting a select list, one
//! root [`TableRef`] and a list of conditions, then renders
//! `SELECT .. FROM .. [WHERE ..]` plus the literals it replaced with
//! placeholders.

pub mod column;
pub mod query;
pub mod table_ref;
pub mod traits;

#[cfg(test)]
mod tests;

pub use column::{Placeholders, QueryColumn, SqlColumn, SqlExpr};
pub use query::QueryBuilder;
pub use table_ref::{SingularRef, TableRef};
pub use traits::{escape_identifier, to_positional, PlaceholderStyle, ToSql};
