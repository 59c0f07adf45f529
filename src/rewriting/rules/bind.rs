//! Introducing and reusing bindings.

use crate::language::expression::{Expr, ExprKind};
use crate::rewriting::alpha::are_alpha_equivalent;
use crate::rewriting::rename::fresh_name;
use crate::rewriting::rule::{Capture, Site};
use crate::rewriting::scope::{Bound, all_names, free_variables};

const FRESH_BASE: &str = "v";

/// Variables, literals and lambdas are never bound to a name of their own.
fn bindable(node: &Expr) -> bool {
    !matches!(
        node.kind,
        ExprKind::Var(_) | ExprKind::Const(_) | ExprKind::Lambda { .. }
    )
}

pub(super) fn match_raw_new_bind(site: &Site) -> Vec<Capture> {
    if !bindable(site.node) {
        return Vec::new();
    }
    vec![Capture::Bind(fresh_name(FRESH_BASE, &all_names(site.root)))]
}

pub(super) fn match_new_bind(site: &Site) -> Vec<Capture> {
    match site.parent {
        Some(parent) if !matches!(parent.kind, ExprKind::Let { .. }) => match_raw_new_bind(site),
        _ => Vec::new(),
    }
}

/// `(let (name node) name)`
pub(super) fn bind_node(node: &Expr, name: &str) -> Expr {
    let reference = Expr::var(name).with_type(node.ty.clone());
    Expr::let_in(name, node.clone(), reference).with_type(node.ty.clone())
}

/// At `(let (z rhs) body)`, every enclosing `(let (y rhs') ..)` with `rhs'`
/// alpha-equivalent to `rhs` whose value `rhs` still denotes.
pub(super) fn match_cse_bind(site: &Site) -> Vec<Capture> {
    let ExprKind::Let { rhs, .. } = &site.node.kind else {
        return Vec::new();
    };
    let free = free_variables(rhs);

    site.scope
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let Bound::Let(bound_rhs) = entry.bound else {
                return None;
            };
            if !are_alpha_equivalent(bound_rhs, rhs) || free.contains(entry.name) {
                return None;
            }
            // Nothing bound in between may shadow the reused name or change a variable of rhs
            let undisturbed = site.scope[position + 1..]
                .iter()
                .all(|inner| inner.name != entry.name && !free.contains(inner.name));
            undisturbed.then(|| Capture::Reuse(entry.name.to_string()))
        })
        .collect()
}

/// Replaces the right-hand side of the matched `let` by a reference to `name`.
pub(super) fn reuse_binding(node: &Expr, name: &str) -> Expr {
    let ExprKind::Let { rhs, .. } = &node.kind else {
        panic!("cannot reuse a binding for {node}, which is not a let");
    };
    node.with_child(0, Expr::var(name).with_type(rhs.ty.clone()))
}
