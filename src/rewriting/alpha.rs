//! Equality of expressions up to consistent renaming of bound variables.
//!
//! Both the comparison and the hash walk the two trees in lockstep with a
//! stack of binders. A bound occurrence is identified by how far up the stack
//! its binder sits, a free one by its name. Type annotations are ignored.

use std::hash::{Hash, Hasher};
use std::mem;

use crate::language::expression::{Expr, ExprKind};

pub fn are_alpha_equivalent(left: &Expr, right: &Expr) -> bool {
    equivalent(left, right, &mut Vec::new())
}

fn equivalent<'e>(left: &'e Expr, right: &'e Expr, binders: &mut Vec<(&'e str, &'e str)>) -> bool {
    match (&left.kind, &right.kind) {
        (ExprKind::Var(a), ExprKind::Var(b)) => {
            let left_binder = binders.iter().rposition(|(bound, _)| *bound == a.as_str());
            let right_binder = binders.iter().rposition(|(_, bound)| *bound == b.as_str());
            match (left_binder, right_binder) {
                (None, None) => a == b,
                (left_binder, right_binder) => left_binder == right_binder,
            }
        }
        (ExprKind::Const(a), ExprKind::Const(b)) => a == b,
        (ExprKind::Call { name: f, args: a }, ExprKind::Call { name: g, args: b }) => {
            f == g && pairwise(a, b, binders)
        }
        (ExprKind::Tuple(a), ExprKind::Tuple(b)) => pairwise(a, b, binders),
        (
            ExprKind::TupleGet { index: i, size: n, tuple: a },
            ExprKind::TupleGet { index: j, size: m, tuple: b },
        ) => i == j && n == m && equivalent(a, b, binders),
        (ExprKind::If { .. }, ExprKind::If { .. }) => {
            pairwise_refs(&left.children(), &right.children(), binders)
        }
        (
            ExprKind::Let { name: x, rhs: r1, body: b1 },
            ExprKind::Let { name: y, rhs: r2, body: b2 },
        ) => equivalent(r1, r2, binders) && under_binder((x.as_str(), y.as_str()), b1, b2, binders),
        (
            ExprKind::Lambda { param: x, body: b1, .. },
            ExprKind::Lambda { param: y, body: b2, .. },
        ) => under_binder((x.as_str(), y.as_str()), b1, b2, binders),
        _ => false,
    }
}

fn under_binder<'e>(
    pair: (&'e str, &'e str),
    left: &'e Expr,
    right: &'e Expr,
    binders: &mut Vec<(&'e str, &'e str)>,
) -> bool {
    binders.push(pair);
    let result = equivalent(left, right, binders);
    binders.pop();
    result
}

fn pairwise<'e>(
    left: &'e [Expr],
    right: &'e [Expr],
    binders: &mut Vec<(&'e str, &'e str)>,
) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| equivalent(a, b, binders))
}

fn pairwise_refs<'e>(
    left: &[&'e Expr],
    right: &[&'e Expr],
    binders: &mut Vec<(&'e str, &'e str)>,
) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(&a, &b)| equivalent(a, b, binders))
}

fn hash_expr<'e, H: Hasher>(expr: &'e Expr, binders: &mut Vec<&'e str>, state: &mut H) {
    mem::discriminant(&expr.kind).hash(state);
    match &expr.kind {
        ExprKind::Var(name) => match binders.iter().rposition(|bound| *bound == name.as_str()) {
            Some(position) => (true, binders.len() - position).hash(state),
            None => (false, name).hash(state),
        },
        ExprKind::Const(literal) => literal.hash(state),
        ExprKind::Call { name, args } => {
            name.hash(state);
            args.len().hash(state);
            for arg in args {
                hash_expr(arg, binders, state);
            }
        }
        ExprKind::Tuple(elements) => {
            elements.len().hash(state);
            for element in elements {
                hash_expr(element, binders, state);
            }
        }
        ExprKind::TupleGet { index, size, tuple } => {
            (index, size).hash(state);
            hash_expr(tuple, binders, state);
        }
        ExprKind::If { .. } => {
            for child in expr.children() {
                hash_expr(child, binders, state);
            }
        }
        ExprKind::Let { name, rhs, body } => {
            hash_expr(rhs, binders, state);
            binders.push(name);
            hash_expr(body, binders, state);
            binders.pop();
        }
        ExprKind::Lambda { param, body, .. } => {
            binders.push(param);
            hash_expr(body, binders, state);
            binders.pop();
        }
    }
}

/// Wrapper whose `Eq` and `Hash` are alpha-equivalence, for use in sets and maps.
#[derive(Clone, Debug)]
pub struct AlphaExpr(pub Expr);

impl AlphaExpr {
    pub fn into_inner(self) -> Expr {
        self.0
    }
}

impl From<Expr> for AlphaExpr {
    fn from(expr: Expr) -> Self {
        Self(expr)
    }
}

impl PartialEq for AlphaExpr {
    fn eq(&self, other: &Self) -> bool {
        are_alpha_equivalent(&self.0, &other.0)
    }
}

impl Eq for AlphaExpr {}

impl Hash for AlphaExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_expr(&self.0, &mut Vec::new(), state)
    }
}
