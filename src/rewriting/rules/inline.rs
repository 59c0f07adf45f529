use crate::language::expression::{Expr, ExprKind};
use crate::rewriting::rename::substitute;
use crate::rewriting::rule::Capture;

pub(super) fn match_inline_let(node: &Expr) -> Vec<Capture> {
    match node.kind {
        ExprKind::Let { .. } => vec![Capture::Node],
        _ => Vec::new(),
    }
}

/// Substitutes the right-hand side for every occurrence of the binder and drops the `let`.
pub(super) fn inline_let(node: &Expr) -> Expr {
    match &node.kind {
        ExprKind::Let { name, rhs, body } => substitute(body, name, rhs),
        _ => panic!("cannot inline {node}, which is not a let"),
    }
}
