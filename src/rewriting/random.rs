//! Random walks through the rewrites of an expression.
//!
//! Each step enumerates every match of the rule set on the current tree,
//! picks one uniformly and applies it. The walk ends after the configured
//! number of steps, or earlier once no rule matches. Seeding the walk makes it
//! reproducible.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::rule::{RewriteRule, RuleSet};
use super::rules::Rule;
use crate::language::expression::Expr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomWalkConfig {
    /// Maximum number of rewrites to apply
    pub steps: usize,
    /// Seed for the generator; `None` seeds from the operating system
    pub seed: Option<u64>,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            seed: None,
        }
    }
}

/// Outcome of a walk: the final tree and the rules applied on the way, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomWalk {
    pub expr: Expr,
    pub applied: Vec<Rule>,
}

pub fn random_rewrite(expr: Expr, rules: &RuleSet, config: &RandomWalkConfig) -> RandomWalk {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut walk = RandomWalk {
        expr,
        applied: Vec::new(),
    };

    for step in 0..config.steps {
        let matches: Vec<_> = rules.find_all_matches(walk.expr.clone()).collect();
        if matches.is_empty() {
            debug!("no rule matches after {step} steps");
            break;
        }
        let chosen = &matches[rng.gen_range(0..matches.len())];
        debug!(
            "step {step}: {} at {} of {} matches",
            chosen.rule().name(),
            chosen.path(),
            matches.len()
        );
        walk.applied.push(chosen.rule());
        walk.expr = chosen.apply_rewrite();
    }
    walk
}

#[cfg(test)]
mod tests {
    use super::{RandomWalkConfig, random_rewrite};
    use crate::language::expression::Expr;
    use crate::language::parsing::parse_expr;
    use crate::rewriting::alpha::are_alpha_equivalent;
    use crate::rewriting::rule::RuleSet;
    use crate::rewriting::rules::{Rule, inline_let, lift_if_rules, lift_let_rules};
    use crate::rule_set;

    fn parse(s: &str) -> Expr {
        parse_expr(s).unwrap()
    }

    #[test]
    fn stops_when_nothing_matches() {
        let rules = RuleSet::new([inline_let()]);
        let config = RandomWalkConfig {
            steps: 10,
            seed: Some(3),
        };
        let walk = random_rewrite(parse("(let (x 1) (let (y 2) (add x y)))"), &rules, &config);

        assert_eq!(walk.expr, parse("(add 1 2)"));
        assert_eq!(walk.applied, vec![Rule::InlineLet, Rule::InlineLet]);
    }

    #[test]
    fn seeded_walks_repeat() {
        let rules = rule_set![lift_let_rules(), lift_if_rules()];
        let expr = parse("(add (let (a (mul x 2)) (if p a 0)) (tuple (if q 1 2) (let (b 3) b)))");
        let config = RandomWalkConfig {
            steps: 4,
            seed: Some(42),
        };

        let first = random_rewrite(expr.clone(), &rules, &config);
        let second = random_rewrite(expr, &rules, &config);
        assert_eq!(first, second);
        assert!(first.applied.len() <= 4);
    }

    #[test]
    fn zero_steps_is_identity() {
        let rules = RuleSet::new([inline_let()]);
        let config = RandomWalkConfig {
            steps: 0,
            ..RandomWalkConfig::default()
        };
        let expr = parse("(let (x 1) x)");
        let walk = random_rewrite(expr.clone(), &rules, &config);
        assert!(are_alpha_equivalent(&walk.expr, &expr));
        assert!(walk.applied.is_empty());
    }
}
