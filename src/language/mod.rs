//! The expression language the rewrite engine operates on: trees, types,
//! the surface parser, and type propagation.

pub mod expression;
pub mod parsing;
pub mod types;
pub mod typing;

pub use expression::{Expr, ExprKind, Literal, OwnedPath, Path};
pub use types::Type;

/// Variable and function names.
pub type Name = String;
