//! Typed expression trees.
//!
//! Trees are immutable values: every rewrite builds a new root and shares
//! nothing mutable with the tree it came from.

pub mod literal;
pub mod path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub use literal::Literal;
pub use path::{OwnedPath, Path};

use super::Name;
use super::types::Type;

/// A node together with the type assigned by type propagation, if it ran.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Option<Type>,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ExprKind {
    Var(Name),
    Const(Literal),
    Call {
        name: Name,
        args: Vec<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Let {
        name: Name,
        rhs: Box<Expr>,
        body: Box<Expr>,
    },
    Lambda {
        param: Name,
        param_ty: Option<Type>,
        body: Box<Expr>,
    },
    Tuple(Vec<Expr>),
    /// Zero-based projection out of a tuple of `size` elements
    TupleGet {
        index: usize,
        size: usize,
        tuple: Box<Expr>,
    },
}

impl From<ExprKind> for Expr {
    fn from(kind: ExprKind) -> Self {
        Self { kind, ty: None }
    }
}

impl Expr {
    pub fn var(name: impl Into<Name>) -> Self {
        ExprKind::Var(name.into()).into()
    }

    pub fn constant(literal: Literal) -> Self {
        ExprKind::Const(literal).into()
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Literal::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Self::constant(Literal::Float(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::constant(Literal::Bool(value))
    }

    pub fn call(name: impl Into<Name>, args: Vec<Expr>) -> Self {
        ExprKind::Call {
            name: name.into(),
            args,
        }
        .into()
    }

    pub fn if_then_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        ExprKind::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
        .into()
    }

    pub fn let_in(name: impl Into<Name>, rhs: Expr, body: Expr) -> Self {
        ExprKind::Let {
            name: name.into(),
            rhs: Box::new(rhs),
            body: Box::new(body),
        }
        .into()
    }

    pub fn lambda(param: impl Into<Name>, param_ty: Option<Type>, body: Expr) -> Self {
        ExprKind::Lambda {
            param: param.into(),
            param_ty,
            body: Box::new(body),
        }
        .into()
    }

    pub fn tuple(elements: Vec<Expr>) -> Self {
        ExprKind::Tuple(elements).into()
    }

    pub fn tuple_get(index: usize, size: usize, tuple: Expr) -> Self {
        ExprKind::TupleGet {
            index,
            size,
            tuple: Box::new(tuple),
        }
        .into()
    }

    pub fn with_type(mut self, ty: Option<Type>) -> Self {
        self.ty = ty;
        self
    }

    /// Variables and literals: evaluating them can neither fail nor cost anything.
    pub fn is_atom(&self) -> bool {
        matches!(self.kind, ExprKind::Var(_) | ExprKind::Const(_))
    }

    /// Name introduced by this node if it is a binder.
    pub fn binder_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Let { name, .. } => Some(name),
            ExprKind::Lambda { param, .. } => Some(param),
            _ => None,
        }
    }

    /// Whether child `index` lies inside the scope of this node's binder.
    pub fn binds_over_child(&self, index: usize) -> bool {
        match self.kind {
            ExprKind::Let { .. } => index == 1,
            ExprKind::Lambda { .. } => index == 0,
            _ => false,
        }
    }

    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Var(_) | ExprKind::Const(_) => Vec::new(),
            ExprKind::Call { args, .. } => args.iter().collect(),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => vec![&**cond, &**then_branch, &**else_branch],
            ExprKind::Let { rhs, body, .. } => vec![&**rhs, &**body],
            ExprKind::Lambda { body, .. } => vec![&**body],
            ExprKind::Tuple(elements) => elements.iter().collect(),
            ExprKind::TupleGet { tuple, .. } => vec![&**tuple],
        }
    }

    pub fn child(&self, index: usize) -> Option<&Expr> {
        self.children().get(index).copied()
    }

    fn child_mut(&mut self, index: usize) -> Option<&mut Expr> {
        match &mut self.kind {
            ExprKind::Var(_) | ExprKind::Const(_) => None,
            ExprKind::Call { args, .. } => args.get_mut(index),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => match index {
                0 => Some(cond.as_mut()),
                1 => Some(then_branch.as_mut()),
                2 => Some(else_branch.as_mut()),
                _ => None,
            },
            ExprKind::Let { rhs, body, .. } => match index {
                0 => Some(rhs.as_mut()),
                1 => Some(body.as_mut()),
                _ => None,
            },
            ExprKind::Lambda { body, .. } => (index == 0).then_some(body.as_mut()),
            ExprKind::Tuple(elements) => elements.get_mut(index),
            ExprKind::TupleGet { tuple, .. } => (index == 0).then_some(tuple.as_mut()),
        }
    }

    /// Copy of this node with child `index` replaced. Out of range indices leave
    /// the node unchanged.
    pub fn with_child(&self, index: usize, child: Expr) -> Expr {
        let mut copy = self.clone();
        if let Some(slot) = copy.child_mut(index) {
            *slot = child;
        }
        copy
    }

    /// Copy of this node with every child mapped through `f`.
    pub fn map_children(&self, mut f: impl FnMut(&Expr) -> Expr) -> Expr {
        let mut copy = self.clone();
        for index in 0..self.children().len() {
            if let Some(slot) = copy.child_mut(index) {
                let mapped = f(slot);
                *slot = mapped;
            }
        }
        copy
    }

    pub fn subexpression(&self, path: Path) -> Option<&Expr> {
        if let Some(head) = path.head() {
            self.child(head)?.subexpression(path.child())
        } else {
            Some(self)
        }
    }

    /// Returns a new root where the subexpression at `path` is replaced by `f` applied to it.
    ///
    /// A path that does not exist in this tree leaves it unchanged.
    pub fn replace_at(&self, path: Path, f: impl FnOnce(&Expr) -> Expr) -> Expr {
        match path.head() {
            None => f(self),
            Some(head) => match self.child(head) {
                Some(child) => self.with_child(head, child.replace_at(path.child(), f)),
                None => self.clone(),
            },
        }
    }

    /// Pre-order iterator over the paths of all subexpressions, root first.
    pub fn iter_paths(&self) -> PathIterator<'_> {
        PathIterator::new(self)
    }

    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|child| child.size()).sum::<usize>()
    }
}

/// Lazy pre-order traversal yielding the path of every node.
#[derive(Clone, Debug)]
pub struct PathIterator<'e> {
    root: &'e Expr,
    pending: Vec<OwnedPath>,
}

impl<'e> PathIterator<'e> {
    pub fn new(root: &'e Expr) -> Self {
        Self {
            root,
            pending: vec![OwnedPath::default()],
        }
    }
}

impl<'e> Iterator for PathIterator<'e> {
    type Item = OwnedPath;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.pending.pop()?;
        if let Some(node) = self.root.subexpression(path.as_path()) {
            let child_count = node.children().len();
            self.pending
                .extend((0..child_count).rev().map(|index| path.joined(index)));
        }
        Some(path)
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Var(name) => write!(f, "{name}"),
            ExprKind::Const(literal) => write!(f, "{literal}"),
            ExprKind::Call { name, args } if args.is_empty() => write!(f, "({name})"),
            ExprKind::Call { name, args } => write!(f, "({name} {})", args.iter().join(" ")),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "(if {cond} {then_branch} {else_branch})"),
            ExprKind::Let { name, rhs, body } => write!(f, "(let ({name} {rhs}) {body})"),
            ExprKind::Lambda {
                param,
                param_ty: Some(ty),
                body,
            } => write!(f, "(lam ({param} : {ty}) {body})"),
            ExprKind::Lambda {
                param,
                param_ty: None,
                body,
            } => write!(f, "(lam ({param}) {body})"),
            ExprKind::Tuple(elements) if elements.is_empty() => write!(f, "(tuple)"),
            ExprKind::Tuple(elements) => write!(f, "(tuple {})", elements.iter().join(" ")),
            ExprKind::TupleGet { index, size, tuple } => {
                write!(f, "(get${}${size} {tuple})", index + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Expr, OwnedPath};
    use crate::language::parsing::parse_expr;

    fn parse(s: &str) -> Expr {
        parse_expr(s).unwrap()
    }

    fn test_display(expression_str: &str) {
        assert_eq!(expression_str, parse(expression_str).to_string());
    }

    #[test]
    fn display_atoms() {
        test_display("x");
        test_display("4.0");
        test_display("-3");
        test_display("true");
    }

    #[test]
    fn display_binders() {
        test_display("(let (x (add x 1)) (mul x x))");
        test_display("(build 10 (lam (i : Integer) (index i v)))");
        test_display("(if p (tuple 1 2.5) (tuple))");
        test_display("(get$2$3 t)");
    }

    #[test]
    fn subexpression_by_path() {
        let expr = parse("(let (y (add x 1)) (mul y 2))");

        assert_eq!(
            expr.subexpression(OwnedPath::from(vec![0]).as_path()),
            Some(&parse("(add x 1)"))
        );
        assert_eq!(
            expr.subexpression(OwnedPath::from(vec![1, 1]).as_path()),
            Some(&parse("2"))
        );
        assert!(expr.subexpression(OwnedPath::from(vec![2]).as_path()).is_none());
    }

    #[test]
    fn replace_at_builds_new_root() {
        let expr = parse("(add (mul a b) c)");
        let path = OwnedPath::from(vec![0, 1]);

        let replaced = expr.replace_at(path.as_path(), |_| Expr::var("z"));

        assert_eq!(replaced, parse("(add (mul a z) c)"));
        assert_eq!(expr, parse("(add (mul a b) c)"));
    }

    #[test]
    fn replace_at_invalid_path_is_identity() {
        let expr = parse("(add a b)");
        let path = OwnedPath::from(vec![0, 3]);
        assert_eq!(expr.replace_at(path.as_path(), |_| Expr::int(0)), expr);
    }

    #[test]
    fn paths_in_pre_order() {
        let expr = parse("(add (neg a) b)");
        let subexpressions: Vec<_> = expr
            .iter_paths()
            .map(|path| expr.subexpression(path.as_path()).unwrap().to_string())
            .collect();

        assert_eq!(subexpressions, vec!["(add (neg a) b)", "(neg a)", "a", "b"]);
    }

    #[test]
    fn binder_scope() {
        let expr = parse("(let (x 1) x)");
        assert!(!expr.binds_over_child(0));
        assert!(expr.binds_over_child(1));
        assert_eq!(expr.binder_name(), Some("x"));
        assert_eq!(expr.size(), 3);
    }
}
