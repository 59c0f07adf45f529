//! Hoisting a `let` or an `if` out of its parent.
//!
//! A child of the parent may be hoisted when the parent evaluates it
//! unconditionally. A branch of an `if` only qualifies when hoisting cannot
//! move a computation to where it would not have run before: the hoisted
//! value is an atom, or the other branch starts with the same binding or test.

use std::collections::HashSet;

use super::LiftSite;
use crate::language::Name;
use crate::language::expression::{Expr, ExprKind};
use crate::language::types::Type;
use crate::rewriting::alpha::are_alpha_equivalent;
use crate::rewriting::rename::rename_binder;
use crate::rewriting::rule::Capture;
use crate::rewriting::scope::free_variables;

/// A child position of a parent that something may be hoisted out of.
struct Slot<'e> {
    /// Selector of the child; for a build, of its lambda
    child: usize,
    target: &'e Expr,
    /// Name the parent binds over the target
    binder: Option<&'e str>,
    /// Selector and value of the other branch when the target is an `if` branch
    sibling: Option<(usize, &'e Expr)>,
}

impl<'e> Slot<'e> {
    fn unconditional(child: usize, target: &'e Expr) -> Self {
        Self {
            child,
            target,
            binder: None,
            sibling: None,
        }
    }
}

/// `(build count (lam (param) body))`
struct Build<'e> {
    count: &'e Expr,
    lambda: &'e Expr,
    param: &'e str,
    body: &'e Expr,
}

fn as_build(node: &Expr) -> Option<Build<'_>> {
    let ExprKind::Call { name, args } = &node.kind else {
        return None;
    };
    let [count, lambda] = args.as_slice() else {
        return None;
    };
    let ExprKind::Lambda { param, body, .. } = &lambda.kind else {
        return None;
    };
    (name == "build").then_some(Build {
        count,
        lambda,
        param: param.as_str(),
        body: &**body,
    })
}

fn slots(site: LiftSite, node: &Expr) -> Vec<Slot<'_>> {
    match (site, &node.kind) {
        (LiftSite::Call, ExprKind::Call { args, .. })
        | (LiftSite::Tuple, ExprKind::Tuple(args)) => args
            .iter()
            .enumerate()
            .map(|(index, arg)| Slot::unconditional(index, arg))
            .collect(),
        (LiftSite::Tuple, ExprKind::TupleGet { tuple, .. }) => {
            vec![Slot::unconditional(0, tuple)]
        }
        (
            LiftSite::If,
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            },
        ) => vec![
            Slot::unconditional(0, cond),
            Slot {
                child: 1,
                target: &**then_branch,
                binder: None,
                sibling: Some((2, &**else_branch)),
            },
            Slot {
                child: 2,
                target: &**else_branch,
                binder: None,
                sibling: Some((1, &**then_branch)),
            },
        ],
        (LiftSite::Let, ExprKind::Let { name, rhs, body }) => vec![
            Slot::unconditional(0, rhs),
            Slot {
                child: 1,
                target: &**body,
                binder: Some(name.as_str()),
                sibling: None,
            },
        ],
        (LiftSite::Build, _) => as_build(node)
            .map(|build| Slot {
                child: 1,
                target: build.body,
                binder: Some(build.param),
                sibling: None,
            })
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn slot_at(site: LiftSite, node: &Expr, child: usize) -> Option<Slot<'_>> {
    slots(site, node).into_iter().find(|slot| slot.child == child)
}

fn shares_let(branch: &Expr, rhs: &Expr) -> bool {
    matches!(&branch.kind, ExprKind::Let { rhs: other, .. } if are_alpha_equivalent(other, rhs))
}

fn shares_if(branch: &Expr, cond: &Expr) -> bool {
    matches!(&branch.kind, ExprKind::If { cond: other, .. } if are_alpha_equivalent(other, cond))
}

/// Whether hoisting `value` out of `slot` keeps evaluation unconditional where it was conditional.
fn evaluated_anyway(slot: &Slot, value: &Expr, shared: impl Fn(&Expr) -> bool) -> bool {
    match slot.sibling {
        None => true,
        // A lift both branches allow is reported once, from the then branch
        Some((sibling_child, sibling)) if shared(sibling) => sibling_child > slot.child,
        Some(_) => value.is_atom(),
    }
}

fn let_is_liftable(slot: &Slot) -> bool {
    let ExprKind::Let { rhs, .. } = &slot.target.kind else {
        return false;
    };
    let binder_free = slot.binder.is_some_and(|binder| free_variables(rhs).contains(binder));
    !binder_free && evaluated_anyway(slot, rhs, |sibling| shares_let(sibling, rhs))
}

fn if_is_liftable(slot: &Slot) -> bool {
    let ExprKind::If { cond, .. } = &slot.target.kind else {
        return false;
    };
    let binder_free = slot.binder.is_some_and(|binder| free_variables(cond).contains(binder));
    !binder_free && evaluated_anyway(slot, cond, |sibling| shares_if(sibling, cond))
}

pub(super) fn match_let(site: LiftSite, node: &Expr) -> Vec<Capture> {
    slots(site, node)
        .iter()
        .filter(|slot| let_is_liftable(slot))
        .map(|slot| Capture::Child(slot.child))
        .collect()
}

pub(super) fn match_if(site: LiftSite, node: &Expr) -> Vec<Capture> {
    slots(site, node)
        .iter()
        .filter(|slot| if_is_liftable(slot))
        .map(|slot| Capture::Child(slot.child))
        .collect()
}

/// Names a hoisted binder must not take: the free variables of the parent
/// outside the hoisted child, and the name the parent binds over it.
fn context(site: LiftSite, node: &Expr, slot: &Slot) -> HashSet<Name> {
    let mut names = match (site, as_build(node)) {
        (LiftSite::Build, Some(build)) => free_variables(build.count),
        _ => free_variables(&node.with_child(slot.child, Expr::tuple(Vec::new()))),
    };
    names.extend(slot.binder.map(str::to_string));
    names
}

/// Names to avoid when both branches of an `if` bind the same value.
fn shared_context(node: &Expr, sibling: &Expr) -> HashSet<Name> {
    let mut names = node.child(0).map(free_variables).unwrap_or_default();
    if let ExprKind::Let { name, body, .. } = &sibling.kind {
        names.extend(free_variables(body));
        names.insert(name.clone());
    }
    names
}

fn typed_like(node: &Expr, ty: Type) -> Option<Type> {
    node.ty.as_ref().map(|_| ty)
}

fn zero(node: &Expr) -> Expr {
    Expr::int(0).with_type(typed_like(node, Type::Integer))
}

/// `(gt count 0)`
fn positive(count: &Expr, node: &Expr) -> Expr {
    Expr::call("gt", vec![count.clone(), zero(node)]).with_type(typed_like(node, Type::Bool))
}

/// Panics unless `child` is a slot of `node` for `site`.
fn liftable_slot(site: LiftSite, node: &Expr, child: usize) -> Slot<'_> {
    slot_at(site, node, child)
        .unwrap_or_else(|| panic!("{node} has no child {child} to lift out of over {site:?}"))
}

pub(super) fn lift_let(site: LiftSite, node: &Expr, child: usize) -> Expr {
    let slot = liftable_slot(site, node, child);
    let shared = slot.sibling.filter(|(_, sibling)| {
        matches!(&slot.target.kind, ExprKind::Let { rhs, .. } if shares_let(sibling, rhs))
    });
    let avoid = match shared {
        Some((_, sibling)) => shared_context(node, sibling),
        None => context(site, node, &slot),
    };
    let hoisted = match slot.target.binder_name() {
        Some(name) if avoid.contains(name) => rename_binder(slot.target, &avoid),
        _ => slot.target.clone(),
    };
    let ExprKind::Let { name, rhs, body } = hoisted.kind else {
        panic!("expected a let at child {child} of {node}");
    };
    let ty = node.ty.clone();

    if site == LiftSite::Build {
        let Some(build) = as_build(node) else {
            unreachable!("build slot outside a build");
        };
        let hoisted_build = node.with_child(1, build.lambda.with_child(0, *body));
        let guarded = Expr::let_in(name, *rhs, hoisted_build).with_type(ty.clone());
        // Building nothing must not evaluate the binding
        let empty = node.with_child(0, zero(node));
        return Expr::if_then_else(positive(build.count, node), guarded, empty).with_type(ty);
    }

    let mut lifted = node.with_child(child, *body);
    if let Some((sibling_child, sibling)) = shared {
        let reference = Expr::var(name.clone()).with_type(rhs.ty.clone());
        lifted = lifted.with_child(sibling_child, sibling.with_child(0, reference));
    }
    Expr::let_in(name, *rhs, lifted).with_type(ty)
}

pub(super) fn lift_if(site: LiftSite, node: &Expr, child: usize) -> Expr {
    let slot = liftable_slot(site, node, child);
    let ExprKind::If {
        cond,
        then_branch,
        else_branch,
    } = &slot.target.kind
    else {
        panic!("expected an if at child {child} of {node}");
    };
    let ty = node.ty.clone();

    if site == LiftSite::Build {
        let Some(build) = as_build(node) else {
            unreachable!("build slot outside a build");
        };
        let with_body =
            |body: &Expr| node.with_child(1, build.lambda.with_child(0, body.clone()));
        let lifted = Expr::if_then_else(
            (**cond).clone(),
            with_body(then_branch.as_ref()),
            with_body(else_branch.as_ref()),
        )
        .with_type(ty.clone());
        return Expr::if_then_else(positive(build.count, node), lifted, node.clone()).with_type(ty);
    }

    let mut then_side = node.with_child(child, (**then_branch).clone());
    let mut else_side = node.with_child(child, (**else_branch).clone());
    if let Some((sibling_child, sibling)) = slot.sibling {
        if let ExprKind::If {
            cond: other,
            then_branch: other_then,
            else_branch: other_else,
        } = &sibling.kind
        {
            if are_alpha_equivalent(other, cond) {
                then_side = then_side.with_child(sibling_child, (**other_then).clone());
                else_side = else_side.with_child(sibling_child, (**other_else).clone());
            }
        }
    }
    Expr::if_then_else((**cond).clone(), then_side, else_side).with_type(ty)
}
