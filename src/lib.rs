#[macro_use]
pub mod macros;

pub mod language;
pub mod rewriting;
