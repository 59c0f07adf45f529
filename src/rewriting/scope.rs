//! Free variables and binder scope.

use std::collections::HashSet;

use crate::language::Name;
use crate::language::expression::{Expr, ExprKind, Path};

/// Names referenced in `expr` but not bound within it.
pub fn free_variables(expr: &Expr) -> HashSet<Name> {
    let mut free = HashSet::new();
    collect_free(expr, &mut Vec::new(), &mut free);
    free
}

fn collect_free<'e>(expr: &'e Expr, bound: &mut Vec<&'e str>, free: &mut HashSet<Name>) {
    match &expr.kind {
        ExprKind::Var(name) => {
            if !bound.contains(&name.as_str()) {
                free.insert(name.clone());
            }
        }
        ExprKind::Let { name, rhs, body } => {
            collect_free(rhs, bound, free);
            bound.push(name);
            collect_free(body, bound, free);
            bound.pop();
        }
        ExprKind::Lambda { param, body, .. } => {
            bound.push(param);
            collect_free(body, bound, free);
            bound.pop();
        }
        _ => {
            for child in expr.children() {
                collect_free(child, bound, free);
            }
        }
    }
}

/// Names introduced by any binder within `expr`.
pub fn bound_names(expr: &Expr) -> HashSet<Name> {
    let mut names = HashSet::new();
    let mut pending = vec![expr];
    while let Some(node) = pending.pop() {
        if let Some(name) = node.binder_name() {
            names.insert(name.to_string());
        }
        pending.extend(node.children());
    }
    names
}

/// Every name that occurs in `expr`, free or bound.
pub fn all_names(expr: &Expr) -> HashSet<Name> {
    let mut names = bound_names(expr);
    names.extend(free_variables(expr));
    names
}

/// What a name in scope is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound<'e> {
    /// Bound by a `let` to the given right-hand side
    Let(&'e Expr),
    /// Bound as a lambda parameter
    Param,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeEntry<'e> {
    pub name: &'e str,
    pub bound: Bound<'e>,
}

/// Binders whose scope contains the node at `path`, outermost first.
///
/// Stops at the deepest existing node if the path leaves the tree.
pub fn enclosing_scope<'e>(root: &'e Expr, path: Path) -> Vec<ScopeEntry<'e>> {
    let mut scope = Vec::new();
    let mut node = root;
    for &selector in path.selectors() {
        if node.binds_over_child(selector) {
            match &node.kind {
                ExprKind::Let { name, rhs, .. } => scope.push(ScopeEntry {
                    name,
                    bound: Bound::Let(rhs),
                }),
                ExprKind::Lambda { param, .. } => scope.push(ScopeEntry {
                    name: param,
                    bound: Bound::Param,
                }),
                _ => {}
            }
        }
        match node.child(selector) {
            Some(child) => node = child,
            None => break,
        }
    }
    scope
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{Bound, all_names, bound_names, enclosing_scope, free_variables};
    use crate::language::expression::{Expr, OwnedPath};
    use crate::language::parsing::parse_expr;

    fn names(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn parse(s: &str) -> Expr {
        parse_expr(s).unwrap()
    }

    #[test]
    fn let_rhs_is_outside_its_binder() {
        let expr = parse("(let (x (add x 1)) (mul x y))");
        assert_eq!(free_variables(&expr), names(&["x", "y"]));
    }

    #[test]
    fn lambda_binds_its_parameter() {
        let expr = parse("(build n (lam (i : Integer) (index i v)))");
        assert_eq!(free_variables(&expr), names(&["n", "v"]));
        assert_eq!(bound_names(&expr), names(&["i"]));
        assert_eq!(all_names(&expr), names(&["n", "v", "i"]));
    }

    #[test]
    fn shadowing() {
        let expr = parse("(let (x 1) (add (let (x x) x) z))");
        assert_eq!(free_variables(&expr), names(&["z"]));
        assert!(free_variables(&parse("(tuple 1 2.0)")).is_empty());
    }

    #[test]
    fn scope_of_a_node() {
        let expr = parse("(let (a 1) (build n (lam (i : Integer) (let (b a) (add a b)))))");
        // (add a b) sits under a, i and b
        let path = OwnedPath::from(vec![1, 1, 0, 1]);
        let scope = enclosing_scope(&expr, path.as_path());

        let scope_names: Vec<_> = scope.iter().map(|entry| entry.name).collect();
        assert_eq!(scope_names, vec!["a", "i", "b"]);
        assert_eq!(scope[0].bound, Bound::Let(&Expr::int(1)));
        assert_eq!(scope[1].bound, Bound::Param);

        // A let's right-hand side is not in the scope of its own binder
        let rhs = OwnedPath::from(vec![1, 1, 0, 0]);
        assert_eq!(enclosing_scope(&expr, rhs.as_path()).len(), 2);
    }
}
