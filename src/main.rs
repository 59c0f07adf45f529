//! Lists, applies or samples the rewrites of a single expression.
//!
//! ```text
//! vinculum --var p:Bool "(add (if p 4.0 2.0) 3.0)"
//! vinculum --rules cse --apply 0 "(let (a (add x 1)) (let (b (add x 1)) (mul a b)))"
//! vinculum --walk 5 --seed 7 --json "(mul (add x 1) (add x 1))"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use vinculum::language::expression::Expr;
use vinculum::language::parsing::{parse_expr, parse_type};
use vinculum::language::types::Type;
use vinculum::language::typing::{SymbolTable, type_propagate};
use vinculum::rewriting::random::{RandomWalkConfig, random_rewrite};
use vinculum::rewriting::rule::{Match, RewriteRule, RuleSet};
use vinculum::rewriting::rules::{
    Rule, cse_bind, inline_let, lift_if_rules, lift_let_rules, new_bind, raw_new_bind,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RuleGroup {
    LiftLet,
    LiftIf,
    NewBind,
    RawNewBind,
    Cse,
    Inline,
    /// Every rule except raw-new-bind
    All,
}

impl RuleGroup {
    fn rules(self) -> Vec<Rule> {
        match self {
            RuleGroup::LiftLet => lift_let_rules(),
            RuleGroup::LiftIf => lift_if_rules(),
            RuleGroup::NewBind => vec![new_bind()],
            RuleGroup::RawNewBind => vec![raw_new_bind()],
            RuleGroup::Cse => vec![cse_bind()],
            RuleGroup::Inline => vec![inline_let()],
            RuleGroup::All => [
                lift_let_rules(),
                lift_if_rules(),
                vec![new_bind(), cse_bind(), inline_let()],
            ]
            .concat(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Enumerate and apply binding-aware rewrites of an expression", long_about = None)]
struct Args {
    /// Expression in s-expression syntax
    expr: String,

    /// Rule groups to match with
    #[arg(short, long = "rules", value_enum, default_value = "all")]
    rules: Vec<RuleGroup>,

    /// Type of a free variable as NAME:TYPE, e.g. `v:(Vec Float)`
    #[arg(long = "var", value_parser = parse_variable)]
    vars: Vec<(String, Type)>,

    /// Apply the match with this number and print the result
    #[arg(short, long, conflicts_with = "walk")]
    apply: Option<usize>,

    /// Apply up to this many randomly chosen rewrites
    #[arg(short, long)]
    walk: Option<usize>,

    /// Seed for the random walk
    #[arg(long, requires = "walk")]
    seed: Option<u64>,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn parse_variable(binding: &str) -> Result<(String, Type), String> {
    let (name, ty) = binding
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:TYPE, got `{binding}`"))?;
    let ty = parse_type(ty.trim()).map_err(|error| error.to_string())?;
    Ok((name.trim().to_string(), ty))
}

#[derive(Tabled, Serialize)]
struct MatchRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Rule")]
    rule: &'static str,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Rewritten Expression")]
    rewritten: String,
}

impl MatchRow {
    fn new(index: usize, matching: &Match) -> Self {
        Self {
            index,
            rule: matching.rule().name(),
            path: matching.path().to_string(),
            rewritten: matching.apply_rewrite().to_string(),
        }
    }
}

#[derive(Serialize)]
struct Applied<'a> {
    rules: Vec<&'static str>,
    result: String,
    tree: &'a Expr,
}

fn print_matches(expr: &Expr, matches: &[Match], json: bool) -> Result<()> {
    let rows: Vec<_> = matches
        .iter()
        .enumerate()
        .map(|(index, matching)| MatchRow::new(index, matching))
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} {expr}", "Expression:".bold());
    if rows.is_empty() {
        println!("{}", "No rule matches".yellow());
        return Ok(());
    }
    println!("{}", format!("{} matches", rows.len()).bold().green());
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn print_applied(applied: &Applied, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(applied)?);
    } else {
        println!("{} {}", "Applied:".bold(), applied.rules.iter().join(", "));
        println!("{} {}", "Result:".bold().green(), applied.result);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let parsed = parse_expr(&args.expr).context("failed to parse the expression")?;
    let table = SymbolTable::prelude().with_variables(args.vars.clone());
    let expr = match type_propagate(&parsed, &table) {
        Ok(typed) => typed,
        Err(error) => {
            warn!("rewriting without types: {error}");
            parsed
        }
    };

    let rules = RuleSet::new(args.rules.iter().flat_map(|group| group.rules()).unique());
    info!(
        "matching with {}",
        rules.rules().iter().map(|rule| rule.name()).join(", ")
    );

    if let Some(steps) = args.walk {
        let config = RandomWalkConfig {
            steps,
            seed: args.seed,
        };
        let walk = random_rewrite(expr, &rules, &config);
        let applied = Applied {
            rules: walk.applied.iter().map(|rule| rule.name()).collect(),
            result: walk.expr.to_string(),
            tree: &walk.expr,
        };
        return print_applied(&applied, args.json);
    }

    let matches: Vec<_> = rules.find_all_matches(expr.clone()).collect();
    match args.apply {
        Some(index) => {
            let chosen = matches
                .get(index)
                .with_context(|| format!("there is no match {index}, found {}", matches.len()))?;
            let rewritten = chosen.apply_rewrite();
            let applied = Applied {
                rules: vec![chosen.rule().name()],
                result: rewritten.to_string(),
                tree: &rewritten,
            };
            print_applied(&applied, args.json)
        }
        None => print_matches(&expr, &matches, args.json),
    }
}
