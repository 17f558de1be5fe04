//! Expression types: literal values, expressions written against names, and
//! expressions resolved against relations.

pub mod expr;
pub mod resolved;
pub mod values;

pub use expr::*;
pub use resolved::*;
pub use values::*;
