//! Parser for the s-expression surface syntax.
//!
//! ```text
//! (let (x (add a 1)) (if (gt x 0) x (neg x)))
//! (build n (lam (i : Integer) (index i v)))
//! ```

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;
use thiserror::Error;

use super::expression::{Expr, Literal};
use super::types::Type;

#[derive(Parser)]
#[grammar = "language/grammar.pest"]
struct ExpressionParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error\n{0}")]
    Syntax(Box<pest::error::Error<Rule>>),
    #[error("invalid number literal `{0}`")]
    Number(String),
    #[error("tuple index {index} out of range for a tuple of {size}")]
    TupleIndex { index: usize, size: usize },
    #[error("malformed {0:?}")]
    Malformed(Rule),
    #[error("unexpected input after {rule:?}: `{rest}`")]
    Trailing { rule: Rule, rest: String },
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(error: pest::error::Error<Rule>) -> Self {
        ParseError::Syntax(Box::new(error))
    }
}

/// Parses a complete expression.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let pairs = ExpressionParser::parse(Rule::expression_input, input)?;
    let input_pair = single(pairs, Rule::expression_input)?;
    build_expr(single(input_pair.into_inner(), Rule::expression_input)?)
}

/// Parses an expression starting from the given grammar rule instead of a
/// whole input, e.g. `Rule::call_expr` for `add x 1` without parentheses.
/// The rule has to consume all of `input` apart from trailing whitespace.
pub fn parse_expr_with(input: &str, start: Rule) -> Result<Expr, ParseError> {
    let pair = single(ExpressionParser::parse(start, input)?, start)?;
    let rest = input[pair.as_span().end()..].trim();
    if !rest.is_empty() {
        return Err(ParseError::Trailing {
            rule: start,
            rest: rest.to_string(),
        });
    }
    build_expr(pair)
}

/// Parses a type, e.g. `(Vec (Tuple Integer Float))`.
pub fn parse_type(input: &str) -> Result<Type, ParseError> {
    let pairs = ExpressionParser::parse(Rule::type_input, input)?;
    let input_pair = single(pairs, Rule::type_input)?;
    build_type(single(input_pair.into_inner(), Rule::type_input)?)
}

fn single(mut pairs: Pairs<'_, Rule>, rule: Rule) -> Result<Pair<'_, Rule>, ParseError> {
    pairs.next().ok_or(ParseError::Malformed(rule))
}

fn parse_number<T: std::str::FromStr>(pair: &Pair<Rule>) -> Result<T, ParseError> {
    pair.as_str()
        .parse()
        .map_err(|_| ParseError::Number(pair.as_str().to_string()))
}

fn build_expr(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let rule = pair.as_rule();
    match rule {
        Rule::integer => Ok(Expr::int(parse_number(&pair)?)),
        Rule::float => Ok(Expr::float(parse_number(&pair)?)),
        Rule::special_float => Ok(Expr::float(match pair.as_str() {
            "+inf.0" => f64::INFINITY,
            "-inf.0" => f64::NEG_INFINITY,
            _ => f64::NAN,
        })),
        Rule::boolean => Ok(Expr::boolean(pair.as_str() == "true")),
        Rule::string => {
            let body = single(pair.into_inner(), rule)?;
            Ok(Expr::constant(Literal::String(body.as_str().to_string())))
        }
        Rule::variable => Ok(Expr::var(pair.as_str())),
        Rule::let_expr => {
            let mut bindings = Vec::new();
            let mut body = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::kw_let => {}
                    Rule::binding => {
                        let mut parts = inner.into_inner();
                        let name = single_from(&mut parts, rule)?.as_str().to_string();
                        let rhs = build_expr(single_from(&mut parts, rule)?)?;
                        bindings.push((name, rhs));
                    }
                    _ => body = Some(build_expr(inner)?),
                }
            }
            let body = body.ok_or(ParseError::Malformed(rule))?;
            // (let ((a 1) (b a)) e) scopes each binding over the ones after it
            Ok(bindings
                .into_iter()
                .rev()
                .fold(body, |body, (name, rhs)| Expr::let_in(name, rhs, body)))
        }
        Rule::if_expr => {
            let mut parts = pair.into_inner().skip(1);
            let cond = build_expr(single_from(&mut parts, rule)?)?;
            let then_branch = build_expr(single_from(&mut parts, rule)?)?;
            let else_branch = build_expr(single_from(&mut parts, rule)?)?;
            Ok(Expr::if_then_else(cond, then_branch, else_branch))
        }
        Rule::lam_expr => {
            let mut parts = pair.into_inner().skip(1);
            let param = single_from(&mut parts, rule)?.as_str().to_string();
            let rest: Vec<_> = parts.collect();
            match <[_; 2]>::try_from(rest) {
                Ok([ty, body]) => Ok(Expr::lambda(param, Some(build_type(ty)?), build_expr(body)?)),
                Err(rest) => {
                    let body = rest.into_iter().next().ok_or(ParseError::Malformed(rule))?;
                    Ok(Expr::lambda(param, None, build_expr(body)?))
                }
            }
        }
        Rule::tuple_expr => Ok(Expr::tuple(
            pair.into_inner()
                .skip(1)
                .map(build_expr)
                .collect::<Result<_, _>>()?,
        )),
        Rule::get_expr => {
            let mut parts = pair.into_inner();
            let mut op = single_from(&mut parts, rule)?.into_inner();
            let index: usize = parse_number(&single_from(&mut op, rule)?)?;
            let size: usize = parse_number(&single_from(&mut op, rule)?)?;
            if index == 0 || index > size {
                return Err(ParseError::TupleIndex { index, size });
            }
            let tuple = build_expr(single_from(&mut parts, rule)?)?;
            Ok(Expr::tuple_get(index - 1, size, tuple))
        }
        Rule::call_expr => {
            let mut parts = pair.into_inner();
            let name = single_from(&mut parts, rule)?.as_str().to_string();
            let args = parts.map(build_expr).collect::<Result<_, _>>()?;
            Ok(Expr::call(name, args))
        }
        _ => Err(ParseError::Malformed(rule)),
    }
}

fn single_from<'i>(
    parts: &mut impl Iterator<Item = Pair<'i, Rule>>,
    rule: Rule,
) -> Result<Pair<'i, Rule>, ParseError> {
    parts.next().ok_or(ParseError::Malformed(rule))
}

fn build_type(pair: Pair<Rule>) -> Result<Type, ParseError> {
    let rule = pair.as_rule();
    match rule {
        Rule::scalar_type => match pair.as_str() {
            "Integer" => Ok(Type::Integer),
            "Float" => Ok(Type::Float),
            "Bool" => Ok(Type::Bool),
            "String" => Ok(Type::String),
            _ => Err(ParseError::Malformed(rule)),
        },
        Rule::vec_type => Ok(Type::vec(build_type(single(pair.into_inner(), rule)?)?)),
        Rule::tensor_type => {
            let mut parts = pair.into_inner();
            let rank = parse_number(&single_from(&mut parts, rule)?)?;
            let element = build_type(single_from(&mut parts, rule)?)?;
            Ok(Type::Tensor(rank, Box::new(element)))
        }
        Rule::tuple_type => Ok(Type::Tuple(
            pair.into_inner().map(build_type).collect::<Result<_, _>>()?,
        )),
        Rule::lam_type => {
            let mut parts = pair.into_inner();
            let argument = build_type(single_from(&mut parts, rule)?)?;
            let result = build_type(single_from(&mut parts, rule)?)?;
            Ok(Type::lam(argument, result))
        }
        _ => Err(ParseError::Malformed(rule)),
    }
}

#[cfg(test)]
mod tests {
    use super::{ParseError, Rule, parse_expr, parse_expr_with, parse_type};
    use crate::language::expression::{Expr, ExprKind, Literal};
    use crate::language::types::Type;

    #[test]
    fn parse_atoms() {
        assert_eq!(parse_expr("x").unwrap(), Expr::var("x"));
        assert_eq!(parse_expr("42").unwrap(), Expr::int(42));
        assert_eq!(parse_expr("-7").unwrap(), Expr::int(-7));
        assert_eq!(parse_expr("4.0").unwrap(), Expr::float(4.0));
        assert_eq!(parse_expr("false").unwrap(), Expr::boolean(false));
        assert_eq!(parse_expr("falsey").unwrap(), Expr::var("falsey"));
    }

    #[test]
    fn printed_floats_parse_back() {
        for value in [1e20, 1e-7, 1.5e300, -2.5, 0.1, -0.0, f64::INFINITY, f64::NEG_INFINITY] {
            let expr = Expr::float(value);
            assert_eq!(parse_expr(&expr.to_string()).unwrap(), expr, "{expr}");
        }
        assert_eq!(Expr::float(1e20).to_string(), "1.0e20");
        assert_eq!(Expr::float(1e-7).to_string(), "1.0e-7");
        assert_eq!(Expr::float(f64::INFINITY).to_string(), "+inf.0");

        let nan = parse_expr(&Expr::float(f64::NAN).to_string()).unwrap();
        assert!(matches!(nan.kind, ExprKind::Const(Literal::Float(value)) if value.is_nan()));
        assert!(matches!(parse_expr("inf").unwrap().kind, ExprKind::Var(_)));
    }

    #[test]
    fn parse_call() {
        let expr = parse_expr("(add (mul a 2) b)").unwrap();
        let expected = Expr::call(
            "add",
            vec![Expr::call("mul", vec![Expr::var("a"), Expr::int(2)]), Expr::var("b")],
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn keywords_need_a_boundary() {
        let expr = parse_expr("(iffy a b c)").unwrap();
        assert!(matches!(expr.kind, ExprKind::Call { ref name, .. } if name == "iffy"));
        let expr = parse_expr("(letter 1)").unwrap();
        assert!(matches!(expr.kind, ExprKind::Call { ref name, .. } if name == "letter"));
    }

    #[test]
    fn parse_let_sugar() {
        let sugared = parse_expr("(let ((a 1) (b (add a 1))) (mul a b))").unwrap();
        let nested = parse_expr("(let (a 1) (let (b (add a 1)) (mul a b)))").unwrap();
        assert_eq!(sugared, nested);
    }

    #[test]
    fn parse_lambda() {
        let typed = parse_expr("(lam (i : Integer) i)").unwrap();
        assert_eq!(typed, Expr::lambda("i", Some(Type::Integer), Expr::var("i")));

        let untyped = parse_expr("(lam (i) i)").unwrap();
        assert_eq!(untyped, Expr::lambda("i", None, Expr::var("i")));
    }

    #[test]
    fn parse_tuples() {
        let expr = parse_expr("(get$2$2 (tuple 1 \"two\"))").unwrap();
        let ExprKind::TupleGet { index, size, .. } = expr.kind else {
            panic!("Expected a tuple projection")
        };
        assert_eq!((index, size), (1, 2));

        assert!(matches!(
            parse_expr("(get$3$2 t)"),
            Err(ParseError::TupleIndex { index: 3, size: 2 })
        ));
    }

    #[test]
    fn comments_and_whitespace() {
        let expr = parse_expr("(add ; the sum\n  x\n  y)").unwrap();
        assert_eq!(expr, parse_expr("(add x y)").unwrap());
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(parse_expr("(add x"), Err(ParseError::Syntax(_))));
        assert!(matches!(parse_expr("(if p x)"), Err(ParseError::Syntax(_))));
        assert!(matches!(parse_expr("let"), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn parse_from_a_start_rule() {
        let call = parse_expr_with("add x 1", Rule::call_expr).unwrap();
        assert_eq!(call, parse_expr("(add x 1)").unwrap());

        let branch = parse_expr_with("if p (let (a 1) a) 0  ", Rule::if_expr).unwrap();
        assert_eq!(branch, parse_expr("(if p (let (a 1) a) 0)").unwrap());

        assert!(matches!(
            parse_expr_with("add x 1) y", Rule::call_expr),
            Err(ParseError::Trailing { rule: Rule::call_expr, .. })
        ));
    }

    #[test]
    fn parse_types() {
        assert_eq!(parse_type("Float").unwrap(), Type::Float);
        assert_eq!(parse_type("(Vec Float)").unwrap(), Type::vec(Type::Float));
        assert_eq!(
            parse_type("(Tuple Integer (Tensor 2 Bool))").unwrap(),
            Type::Tuple(vec![Type::Integer, Type::Tensor(2, Box::new(Type::Bool))])
        );
        assert_eq!(
            parse_type("(Lam Integer Float)").unwrap(),
            Type::lam(Type::Integer, Type::Float)
        );
    }
}
