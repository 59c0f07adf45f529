use serde::{Deserialize, Serialize};

/// Type assigned to every node by type propagation.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Float,
    Bool,
    String,
    /// Tensor of the given rank; `(Vec T)` is a rank 1 tensor
    Tensor(usize, Box<Type>),
    Tuple(Vec<Type>),
    /// Function from argument type to result type
    Lam(Box<Type>, Box<Type>),
}

impl Type {
    pub fn vec(element: Type) -> Self {
        Type::Tensor(1, Box::new(element))
    }

    pub fn lam(argument: Type, result: Type) -> Self {
        Type::Lam(Box::new(argument), Box::new(result))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    /// Element type of a rank 1 tensor.
    pub fn vec_element(&self) -> Option<&Type> {
        match self {
            Type::Tensor(1, element) => Some(element),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer => write!(f, "Integer"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::Tensor(1, element) => write!(f, "(Vec {element})"),
            Type::Tensor(rank, element) => write!(f, "(Tensor {rank} {element})"),
            Type::Tuple(elements) => {
                write!(f, "(Tuple")?;
                for element in elements {
                    write!(f, " {element}")?;
                }
                write!(f, ")")
            }
            Type::Lam(argument, result) => write!(f, "(Lam {argument} {result})"),
        }
    }
}
