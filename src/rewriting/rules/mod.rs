//! The rewrite rule library.
//!
//! Rules form a closed set: each variant of [`Rule`] bundles a pattern, a
//! legality check and a rewrite. The functions below name the individual
//! rules and the groups they are usually used in.

mod bind;
mod inline;
mod lift;

use serde::{Deserialize, Serialize};

use super::rule::{Capture, RewriteRule, Site};
use crate::language::expression::Expr;

/// The kind of parent a let or if is hoisted out of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiftSite {
    /// Any argument of a call
    Call,
    /// Any tuple element, or the operand of a projection
    Tuple,
    /// The condition of an if, or one of its branches
    If,
    /// The right-hand side or the body of a let
    Let,
    /// The body of the lambda passed to `build`
    Build,
}

impl LiftSite {
    pub const ALL: [LiftSite; 5] = [
        LiftSite::Call,
        LiftSite::Tuple,
        LiftSite::If,
        LiftSite::Let,
        LiftSite::Build,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    LiftLet(LiftSite),
    LiftIf(LiftSite),
    RawNewBind,
    NewBind,
    CseBind,
    InlineLet,
}

impl RewriteRule for Rule {
    fn name(&self) -> &'static str {
        match self {
            Rule::LiftLet(LiftSite::Call) => "lift_let_over_call",
            Rule::LiftLet(LiftSite::Tuple) => "lift_let_over_tuple",
            Rule::LiftLet(LiftSite::If) => "lift_let_over_if",
            Rule::LiftLet(LiftSite::Let) => "lift_let_over_let",
            Rule::LiftLet(LiftSite::Build) => "lift_let_over_build",
            Rule::LiftIf(LiftSite::Call) => "lift_if_over_call",
            Rule::LiftIf(LiftSite::Tuple) => "lift_if_over_tuple",
            Rule::LiftIf(LiftSite::If) => "lift_if_over_if",
            Rule::LiftIf(LiftSite::Let) => "lift_if_over_let",
            Rule::LiftIf(LiftSite::Build) => "lift_if_over_build",
            Rule::RawNewBind => "raw_new_bind",
            Rule::NewBind => "new_bind",
            Rule::CseBind => "cse_bind",
            Rule::InlineLet => "inline_let",
        }
    }

    fn try_match(&self, site: &Site) -> Vec<Capture> {
        match *self {
            Rule::LiftLet(lift_site) => lift::match_let(lift_site, site.node),
            Rule::LiftIf(lift_site) => lift::match_if(lift_site, site.node),
            Rule::RawNewBind => bind::match_raw_new_bind(site),
            Rule::NewBind => bind::match_new_bind(site),
            Rule::CseBind => bind::match_cse_bind(site),
            Rule::InlineLet => inline::match_inline_let(site.node),
        }
    }

    fn rewrite(&self, node: &Expr, capture: &Capture) -> Expr {
        match (*self, capture) {
            (Rule::LiftLet(lift_site), Capture::Child(child)) => {
                lift::lift_let(lift_site, node, *child)
            }
            (Rule::LiftIf(lift_site), Capture::Child(child)) => {
                lift::lift_if(lift_site, node, *child)
            }
            (Rule::RawNewBind | Rule::NewBind, Capture::Bind(name)) => bind::bind_node(node, name),
            (Rule::CseBind, Capture::Reuse(name)) => bind::reuse_binding(node, name),
            (Rule::InlineLet, Capture::Node) => inline::inline_let(node),
            (rule, capture) => panic!("{rule} cannot rewrite with {capture:?}"),
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub fn lift_let_over_call() -> Rule {
    Rule::LiftLet(LiftSite::Call)
}

pub fn lift_let_over_tuple() -> Rule {
    Rule::LiftLet(LiftSite::Tuple)
}

pub fn lift_let_over_if() -> Rule {
    Rule::LiftLet(LiftSite::If)
}

pub fn lift_let_over_let() -> Rule {
    Rule::LiftLet(LiftSite::Let)
}

pub fn lift_let_over_build() -> Rule {
    Rule::LiftLet(LiftSite::Build)
}

pub fn lift_if_over_call() -> Rule {
    Rule::LiftIf(LiftSite::Call)
}

pub fn lift_if_over_tuple() -> Rule {
    Rule::LiftIf(LiftSite::Tuple)
}

pub fn lift_if_over_if() -> Rule {
    Rule::LiftIf(LiftSite::If)
}

pub fn lift_if_over_let() -> Rule {
    Rule::LiftIf(LiftSite::Let)
}

pub fn lift_if_over_build() -> Rule {
    Rule::LiftIf(LiftSite::Build)
}

/// Binds any non-atomic subexpression to a fresh name in place.
pub fn raw_new_bind() -> Rule {
    Rule::RawNewBind
}

/// Like [`raw_new_bind`], restricted to subexpressions that are not already let-bound.
pub fn new_bind() -> Rule {
    Rule::NewBind
}

pub fn cse_bind() -> Rule {
    Rule::CseBind
}

pub fn inline_let() -> Rule {
    Rule::InlineLet
}

pub fn lift_let_rules() -> Vec<Rule> {
    LiftSite::ALL.into_iter().map(Rule::LiftLet).collect()
}

pub fn lift_if_rules() -> Vec<Rule> {
    LiftSite::ALL.into_iter().map(Rule::LiftIf).collect()
}
