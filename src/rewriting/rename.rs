//! Fresh names, binder renaming and capture-avoiding substitution.

use std::collections::HashSet;

use log::debug;

use super::scope::{all_names, free_variables};
use crate::language::Name;
use crate::language::expression::{Expr, ExprKind};

/// `base_0`, `base_1`, ...: the first candidate not in `avoid`.
pub fn fresh_name(base: &str, avoid: &HashSet<Name>) -> Name {
    let mut suffix = 0usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !avoid.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Alpha-equivalent copy of a `let` or lambda whose binder is renamed to a name
/// outside `avoid` and unused anywhere in `binder`.
///
/// Only occurrences in the binder's own scope change. Other nodes are returned unchanged.
pub fn rename_binder(binder: &Expr, avoid: &HashSet<Name>) -> Expr {
    let Some(old) = binder.binder_name() else {
        return binder.clone();
    };
    let mut taken = avoid.clone();
    taken.extend(all_names(binder));
    let new = fresh_name(old, &taken);
    debug!("renaming binder `{old}` to `{new}`");

    let kind = match &binder.kind {
        ExprKind::Let { name, rhs, body } => ExprKind::Let {
            name: new.clone(),
            rhs: rhs.clone(),
            body: Box::new(rename_free(body, name, &new)),
        },
        ExprKind::Lambda {
            param,
            param_ty,
            body,
        } => ExprKind::Lambda {
            param: new.clone(),
            param_ty: param_ty.clone(),
            body: Box::new(rename_free(body, param, &new)),
        },
        _ => return binder.clone(),
    };
    Expr::from(kind).with_type(binder.ty.clone())
}

/// Renames the free occurrences of `from` to `to`, keeping their types.
///
/// `to` must not be bound anywhere in `expr`.
pub fn rename_free(expr: &Expr, from: &str, to: &str) -> Expr {
    match &expr.kind {
        ExprKind::Var(name) if name == from => Expr::var(to).with_type(expr.ty.clone()),
        _ if expr.binder_name() == Some(from) => {
            map_outside_binder(expr, |child| rename_free(child, from, to))
        }
        _ => expr.map_children(|child| rename_free(child, from, to)),
    }
}

/// Replaces the free occurrences of `name` in `expr` by `replacement`.
///
/// Binders inside `expr` that would capture a free variable of `replacement`
/// are renamed first.
pub fn substitute(expr: &Expr, name: &str, replacement: &Expr) -> Expr {
    let captured = free_variables(replacement);
    substitute_avoiding(expr, name, replacement, &captured)
}

fn substitute_avoiding(
    expr: &Expr,
    name: &str,
    replacement: &Expr,
    captured: &HashSet<Name>,
) -> Expr {
    let recurse = |child: &Expr| substitute_avoiding(child, name, replacement, captured);
    match &expr.kind {
        ExprKind::Var(var) if var == name => replacement.clone(),
        _ => match expr.binder_name() {
            Some(bound) if bound == name => map_outside_binder(expr, recurse),
            Some(bound) if captured.contains(bound) && scope_mentions(expr, name) => {
                let mut avoid = captured.clone();
                avoid.insert(name.to_string());
                rename_binder(expr, &avoid).map_children(recurse)
            }
            _ => expr.map_children(recurse),
        },
    }
}

/// Whether `name` occurs free in the part of `binder` its binder scopes over.
fn scope_mentions(binder: &Expr, name: &str) -> bool {
    binder
        .children()
        .into_iter()
        .enumerate()
        .any(|(index, child)| {
            binder.binds_over_child(index) && free_variables(child).contains(name)
        })
}

/// Maps only the children outside the scope of this node's binder.
fn map_outside_binder(binder: &Expr, mut f: impl FnMut(&Expr) -> Expr) -> Expr {
    let mut mapped = binder.clone();
    for (index, child) in binder.children().into_iter().enumerate() {
        if !binder.binds_over_child(index) {
            mapped = mapped.with_child(index, f(child));
        }
    }
    mapped
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{fresh_name, rename_binder, rename_free, substitute};
    use crate::language::expression::Expr;
    use crate::language::parsing::parse_expr;
    use crate::language::typing::{SymbolTable, type_propagate};
    use crate::language::types::Type;

    fn parse(s: &str) -> Expr {
        parse_expr(s).unwrap()
    }

    fn avoid(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn smallest_unused_suffix() {
        assert_eq!(fresh_name("x", &avoid(&[])), "x_0");
        assert_eq!(fresh_name("x", &avoid(&["x", "x_0", "x_2"])), "x_1");
    }

    #[test]
    fn rename_binder_only_touches_its_scope() {
        let renamed = rename_binder(&parse("(let (x (add x 1)) (mul x x))"), &avoid(&["x"]));
        assert_eq!(renamed, parse("(let (x_0 (add x 1)) (mul x_0 x_0))"));

        let renamed = rename_binder(&parse("(lam (i : Integer) (let (i 2) i))"), &avoid(&[]));
        assert_eq!(renamed, parse("(lam (i_0 : Integer) (let (i 2) i))"));
    }

    #[test]
    fn rename_binder_skips_names_in_use() {
        let renamed = rename_binder(&parse("(let (y 1) (add y y_0))"), &avoid(&["y"]));
        assert_eq!(renamed, parse("(let (y_1 1) (add y_1 y_0))"));
    }

    #[test]
    fn rename_keeps_types() {
        let table = SymbolTable::prelude().with_variable("x", Type::Float);
        let typed = type_propagate(&parse("(let (x (add x 1.0)) x)"), &table).unwrap();
        let renamed = rename_binder(&typed, &avoid(&["x"]));

        let expected = type_propagate(&parse("(let (x_0 (add x 1.0)) x_0)"), &table).unwrap();
        assert_eq!(renamed, expected);
    }

    #[test]
    fn rename_free_respects_shadowing() {
        let expr = parse("(add x (let (x 1) x))");
        assert_eq!(rename_free(&expr, "x", "z"), parse("(add z (let (x 1) x))"));
    }

    #[test]
    fn substitution() {
        let expr = parse("(add x (mul x y))");
        assert_eq!(substitute(&expr, "x", &parse("(neg a)")), parse("(add (neg a) (mul (neg a) y))"));
    }

    #[test]
    fn substitution_stops_at_shadowing_binder() {
        let replacement = parse("5");
        assert_eq!(substitute(&parse("(let (x 2) x)"), "x", &replacement), parse("(let (x 2) x)"));
        assert_eq!(substitute(&parse("(let (x x) x)"), "x", &replacement), parse("(let (x 5) x)"));
    }

    #[test]
    fn substitution_avoids_capture() {
        let expr = parse("(let (y 2) (add x y))");
        assert_eq!(
            substitute(&expr, "x", &parse("(mul y 3)")),
            parse("(let (y_0 2) (add (mul y 3) y_0))")
        );

        let expr = parse("(lam (i : Integer) (add i x))");
        assert_eq!(
            substitute(&expr, "x", &parse("i")),
            parse("(lam (i_0 : Integer) (add i_0 i))")
        );

        // no renaming when the binder does not scope over the substituted name
        let expr = parse("(let (y 2) (add y 1))");
        assert_eq!(substitute(&expr, "x", &parse("y")), expr);
    }
}
