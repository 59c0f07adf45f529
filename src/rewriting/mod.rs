//! The binding-aware rewriting engine.
//!
//! Scope analysis, alpha-equivalence and capture-avoiding renaming underpin
//! the rule framework in [`rule`] and the rule library in [`rules`].

pub mod alpha;
pub mod random;
pub mod rename;
pub mod rule;
pub mod rules;
pub mod scope;
