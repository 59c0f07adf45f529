use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::language::types::Type;

#[derive(Clone, Hash, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Literal {
    Integer(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
    String(String),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Integer(_) => Type::Integer,
            Literal::Float(_) => Type::Float,
            Literal::Bool(_) => Type::Bool,
            Literal::String(_) => Type::String,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Integer(int) => write!(f, "{int}"),
            Literal::Float(float) => write_float(f, float.0),
            Literal::Bool(boolean) => write!(f, "{boolean}"),
            Literal::String(string) => write!(f, "{string:?}"),
        }
    }
}

/// Non-finite values are spelled `+inf.0`, `-inf.0` and `+nan.0`; finite ones
/// always carry a decimal point before any exponent.
fn write_float(f: &mut std::fmt::Formatter<'_>, value: f64) -> std::fmt::Result {
    if value.is_nan() {
        return f.write_str("+nan.0");
    }
    if value.is_infinite() {
        return f.write_str(if value > 0.0 { "+inf.0" } else { "-inf.0" });
    }
    // Debug keeps the decimal point on whole floats but not in exponent form
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            write!(f, "{mantissa}.0e{exponent}")
        }
        _ => f.write_str(&text),
    }
}
