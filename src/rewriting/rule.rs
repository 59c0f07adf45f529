//! Rules, rule sets and matches.
//!
//! A [`RuleSet`] walks every node of a tree in pre-order and asks each of its
//! rules whether it applies there. Every positive answer becomes a [`Match`],
//! which owns a handle to the tree it was found in and rebuilds that tree with
//! the rewrite applied on request.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;

use super::rules::Rule;
use super::scope::{ScopeEntry, enclosing_scope};
use crate::language::Name;
use crate::language::expression::{Expr, OwnedPath, Path};

/// What a rule recorded about a node it matched, enough to rebuild the node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Capture {
    /// A child of the matched node (for hoisting out of a build, the build's lambda)
    Child(usize),
    /// The matched node as a whole
    Node,
    /// Bind the matched node to this fresh name
    Bind(Name),
    /// Reuse the enclosing binding of this name
    Reuse(Name),
}

/// A node together with the context rules need to decide legality.
#[derive(Clone, Debug)]
pub struct Site<'e> {
    pub root: &'e Expr,
    pub path: Path<'e>,
    pub node: &'e Expr,
    pub parent: Option<&'e Expr>,
    /// Binders whose scope contains `node`, outermost first
    pub scope: Vec<ScopeEntry<'e>>,
}

impl<'e> Site<'e> {
    /// Returns `None` if `path` does not lead to a node of `root`.
    pub fn locate(root: &'e Expr, path: Path<'e>) -> Option<Self> {
        let node = root.subexpression(path)?;
        let parent = path.parent().and_then(|parent| root.subexpression(parent));
        Some(Self {
            root,
            path,
            node,
            parent,
            scope: enclosing_scope(root, path),
        })
    }
}

pub trait RewriteRule {
    fn name(&self) -> &'static str;

    /// Every way this rule applies at `site`; empty if it does not apply.
    fn try_match(&self, site: &Site) -> Vec<Capture>;

    /// Replacement for the matched node.
    ///
    /// Panics if `capture` is not one that `try_match` returned for `node`.
    fn rewrite(&self, node: &Expr, capture: &Capture) -> Expr;
}

/// A legal rewrite at a specific position of a specific tree.
///
/// Only [`RuleSet::find_all_matches`] creates matches, so a match always
/// refers to a node that exists in its own root.
#[derive(Clone, Debug)]
pub struct Match {
    rule: Rule,
    root: Arc<Expr>,
    path: OwnedPath,
    capture: Capture,
}

impl Match {
    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn path(&self) -> Path<'_> {
        self.path.as_path()
    }

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// The node the rule matched.
    pub fn node(&self) -> Option<&Expr> {
        self.root.subexpression(self.path.as_path())
    }

    /// Returns a new root with the rewrite applied. The matched tree is unchanged.
    pub fn apply_rewrite(&self) -> Expr {
        debug!("applying {} at {}", self.rule.name(), self.path);
        self.root
            .replace_at(self.path.as_path(), |node| self.rule.rewrite(node, &self.capture))
    }
}

/// Converts single rules and rule groups for [`rule_set!`](crate::rule_set).
pub trait IntoRules {
    fn into_rules(self) -> Vec<Rule>;
}

impl IntoRules for Rule {
    fn into_rules(self) -> Vec<Rule> {
        vec![self]
    }
}

impl IntoRules for Vec<Rule> {
    fn into_rules(self) -> Vec<Rule> {
        self
    }
}

impl<const N: usize> IntoRules for [Rule; N] {
    fn into_rules(self) -> Vec<Rule> {
        self.to_vec()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Lazily enumerates every match of every rule, visiting nodes in pre-order.
    pub fn find_all_matches(&self, root: impl Into<Arc<Expr>>) -> Matches<'_> {
        Matches {
            rules: &self.rules,
            root: root.into(),
            pending: vec![OwnedPath::default()],
            found: VecDeque::new(),
        }
    }

    /// Every rewrite of `root`, one per match.
    pub fn all_rewrites(&self, root: impl Into<Arc<Expr>>) -> Vec<Expr> {
        self.find_all_matches(root).map(|matching| matching.apply_rewrite()).collect()
    }

    /// Every rewrite of each tree, computed in parallel across trees.
    pub fn rewrite_each(&self, roots: &[Expr]) -> Vec<Vec<Expr>> {
        roots
            .par_iter()
            .map(|root| self.all_rewrites(root.clone()))
            .collect()
    }
}

/// Iterator returned by [`RuleSet::find_all_matches`].
pub struct Matches<'r> {
    rules: &'r [Rule],
    root: Arc<Expr>,
    pending: Vec<OwnedPath>,
    found: VecDeque<Match>,
}

impl Iterator for Matches<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            if let Some(found) = self.found.pop_front() {
                return Some(found);
            }
            let path = self.pending.pop()?;
            let root = Arc::clone(&self.root);
            let Some(site) = Site::locate(&root, path.as_path()) else {
                continue;
            };
            let child_count = site.node.children().len();
            self.pending
                .extend((0..child_count).rev().map(|index| path.joined(index)));

            for rule in self.rules {
                for capture in rule.try_match(&site) {
                    trace!("{} matches at {path}: {capture:?}", rule.name());
                    self.found.push_back(Match {
                        rule: *rule,
                        root: Arc::clone(&root),
                        path: path.clone(),
                        capture,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Capture, RuleSet};
    use crate::language::expression::Expr;
    use crate::language::parsing::parse_expr;
    use crate::rewriting::rules::{Rule, inline_let, lift_if_rules, lift_let_over_call, lift_let_rules};

    fn parse(s: &str) -> Expr {
        parse_expr(s).unwrap()
    }

    #[test]
    fn no_match_is_not_an_error() {
        let rules = RuleSet::new(lift_let_rules());
        assert_eq!(rules.find_all_matches(parse("(add x 1)")).count(), 0);
        assert_eq!(rules.find_all_matches(parse("x")).count(), 0);
    }

    #[test]
    fn matches_are_lazy_and_ordered() {
        let expr = parse("(let (a 1) (let (b 2) (let (c 3) (add a (add b c)))))");
        let rules = RuleSet::new([inline_let()]);

        let mut matches = rules.find_all_matches(expr);
        let first = matches.next().unwrap();
        assert!(first.path().selectors().is_empty());
        assert_eq!(first.capture(), &Capture::Node);
        assert_eq!(first.node().unwrap().binder_name(), Some("a"));

        let rest: Vec<_> = matches.map(|matching| matching.path().to_owned_path()).collect();
        assert_eq!(rest.iter().map(|path| path.len()).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn applying_is_pure() {
        let expr = parse("(add (let (x 4.0) (add x 2.0)) 3.0)");
        let rules = RuleSet::new([lift_let_over_call()]);
        let matching = rules.find_all_matches(expr.clone()).next().unwrap();

        let first = matching.apply_rewrite();
        let second = matching.apply_rewrite();
        assert_eq!(first, second);
        assert_eq!(matching.root(), &expr);
        assert_eq!(matching.rule(), Rule::LiftLet(crate::rewriting::rules::LiftSite::Call));
    }

    #[test]
    fn matches_can_cross_threads() {
        let rules = RuleSet::new(lift_if_rules());
        let matching = rules.find_all_matches(parse("(add (if p 1 2) 3)")).next().unwrap();
        let rewritten = std::thread::spawn(move || matching.apply_rewrite()).join().unwrap();
        assert_eq!(rewritten, parse("(if p (add 1 3) (add 2 3))"));
    }

    #[test]
    fn rewrite_each_tree() {
        let rules = crate::rule_set![lift_let_rules(), lift_if_rules()];
        let exprs = [
            parse("(add (if p 1 2) 3)"),
            parse("(add x 1)"),
            parse("(mul (let (y 2) y) (if q 3 4))"),
        ];
        let rewrites = rules.rewrite_each(&exprs);

        assert_eq!(rewrites.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 0, 2]);
        assert_eq!(rewrites[0], rules.all_rewrites(exprs[0].clone()));
    }
}
