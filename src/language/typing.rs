//! Type propagation.
//!
//! Annotates every node of a tree with its type given the types of its free
//! variables. The environment is an immutable [`SymbolTable`] threaded through
//! the recursion; binders extend a persistent copy of it.

use itertools::Itertools;
use thiserror::Error;

use super::Name;
use super::expression::{Expr, ExprKind};
use super::types::Type;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub args: Vec<Type>,
    pub result: Type,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unbound name `{0}`")]
    UnboundName(Name),
    #[error("no overload of `{name}` accepts ({})", .args.iter().join(", "))]
    NoMatchingOverload { name: Name, args: Vec<Type> },
    #[error("condition has type {0}, expected Bool")]
    NonBoolCondition(Type),
    #[error("branches disagree: {0} and {1}")]
    BranchMismatch(Type, Type),
    #[error("lambda parameter `{0}` has no declared type")]
    UntypedParameter(Name),
    #[error("index {index} out of range for {ty}")]
    TupleIndexOutOfRange { index: usize, ty: Type },
    #[error("expected a tuple, found {0}")]
    NotATuple(Type),
}

/// Types of variables and signatures of functions in scope.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    variables: im::HashMap<Name, Type>,
    functions: im::HashMap<Name, Vec<Signature>>,
}

impl SymbolTable {
    /// Arithmetic, comparison and logic primitives. The generic builtins
    /// (`build`, `sumbuild`, `index`, `size`, `fold`) are always available.
    pub fn prelude() -> Self {
        let mut table = Self::default();

        for name in ["add", "sub", "mul", "div", "max", "min"] {
            for ty in [Type::Integer, Type::Float] {
                table = table.with_function(name, vec![ty.clone(), ty.clone()], ty);
            }
        }
        for name in ["neg", "abs"] {
            for ty in [Type::Integer, Type::Float] {
                table = table.with_function(name, vec![ty.clone()], ty);
            }
        }
        for name in ["gt", "lt", "gte", "lte", "eq", "ne"] {
            for ty in [Type::Integer, Type::Float] {
                table = table.with_function(name, vec![ty.clone(), ty], Type::Bool);
            }
        }
        for name in ["and", "or"] {
            table = table.with_function(name, vec![Type::Bool, Type::Bool], Type::Bool);
        }
        table
            .with_function("not", vec![Type::Bool], Type::Bool)
            .with_function("to_float", vec![Type::Integer], Type::Float)
    }

    pub fn with_variable(&self, name: impl Into<Name>, ty: Type) -> Self {
        let mut table = self.clone();
        table.variables.insert(name.into(), ty);
        table
    }

    pub fn with_variables<N: Into<Name>>(
        &self,
        variables: impl IntoIterator<Item = (N, Type)>,
    ) -> Self {
        variables
            .into_iter()
            .fold(self.clone(), |table, (name, ty)| table.with_variable(name, ty))
    }

    /// Adds an overload of `name`; earlier overloads with the same argument types are shadowed.
    pub fn with_function(&self, name: impl Into<Name>, args: Vec<Type>, result: Type) -> Self {
        let mut table = self.clone();
        let overloads = table.functions.entry(name.into()).or_insert_with(Vec::new);
        overloads.retain(|signature| signature.args != args);
        overloads.push(Signature { args, result });
        table
    }

    pub fn variable(&self, name: &str) -> Option<&Type> {
        self.variables.get(name)
    }

    /// Result type of calling `name` with arguments of the given types.
    pub fn call_result(&self, name: &str, args: &[Type]) -> Option<Type> {
        if let Some(result) = builtin_result(name, args) {
            return Some(result);
        }
        self.functions
            .get(name)?
            .iter()
            .find(|signature| signature.args == args)
            .map(|signature| signature.result.clone())
    }
}

fn builtin_result(name: &str, args: &[Type]) -> Option<Type> {
    match (name, args) {
        ("build", [Type::Integer, Type::Lam(argument, element)]) if **argument == Type::Integer => {
            Some(Type::vec((**element).clone()))
        }
        ("sumbuild", [Type::Integer, Type::Lam(argument, element)])
            if **argument == Type::Integer && element.is_numeric() =>
        {
            Some((**element).clone())
        }
        ("index", [Type::Integer, vector]) => vector.vec_element().cloned(),
        ("size", [vector]) => vector.vec_element().map(|_| Type::Integer),
        ("fold", [Type::Lam(argument, state), initial, vector]) => {
            let element = vector.vec_element()?;
            let expected = Type::Tuple(vec![initial.clone(), element.clone()]);
            (**argument == expected && **state == *initial).then(|| initial.clone())
        }
        _ => None,
    }
}

/// Returns a copy of `expr` with every node annotated.
pub fn type_propagate(expr: &Expr, table: &SymbolTable) -> Result<Expr, TypeError> {
    match &expr.kind {
        ExprKind::Var(name) => {
            let ty = table
                .variable(name)
                .cloned()
                .ok_or_else(|| TypeError::UnboundName(name.clone()))?;
            Ok(expr.clone().with_type(Some(ty)))
        }
        ExprKind::Const(literal) => Ok(expr.clone().with_type(Some(literal.ty()))),
        ExprKind::Call { name, args } => {
            let lambda_param =
                matches!(name.as_str(), "build" | "sumbuild").then_some(Type::Integer);
            let args = args
                .iter()
                .enumerate()
                .map(|(position, arg)| match &arg.kind {
                    ExprKind::Lambda { param_ty: None, .. } if position == 1 => {
                        type_lambda(arg, lambda_param.clone(), table)
                    }
                    _ => type_propagate(arg, table),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let arg_types = args.iter().map(type_of).collect::<Vec<_>>();
            let result = table
                .call_result(name, &arg_types)
                .ok_or_else(|| TypeError::NoMatchingOverload {
                    name: name.clone(),
                    args: arg_types,
                })?;
            Ok(Expr::call(name.clone(), args).with_type(Some(result)))
        }
        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let cond = type_propagate(cond, table)?;
            if type_of(&cond) != Type::Bool {
                return Err(TypeError::NonBoolCondition(type_of(&cond)));
            }
            let then_branch = type_propagate(then_branch, table)?;
            let else_branch = type_propagate(else_branch, table)?;
            let (then_ty, else_ty) = (type_of(&then_branch), type_of(&else_branch));
            if then_ty != else_ty {
                return Err(TypeError::BranchMismatch(then_ty, else_ty));
            }
            Ok(Expr::if_then_else(cond, then_branch, else_branch).with_type(Some(then_ty)))
        }
        ExprKind::Let { name, rhs, body } => {
            let rhs = type_propagate(rhs, table)?;
            let body = type_propagate(body, &table.with_variable(name.clone(), type_of(&rhs)))?;
            let ty = type_of(&body);
            Ok(Expr::let_in(name.clone(), rhs, body).with_type(Some(ty)))
        }
        ExprKind::Lambda { .. } => type_lambda(expr, None, table),
        ExprKind::Tuple(elements) => {
            let elements = elements
                .iter()
                .map(|element| type_propagate(element, table))
                .collect::<Result<Vec<_>, _>>()?;
            let ty = Type::Tuple(elements.iter().map(type_of).collect());
            Ok(Expr::tuple(elements).with_type(Some(ty)))
        }
        ExprKind::TupleGet { index, size, tuple } => {
            let tuple = type_propagate(tuple, table)?;
            let element = match type_of(&tuple) {
                Type::Tuple(elements) if elements.len() == *size && *index < *size => {
                    elements[*index].clone()
                }
                Type::Tuple(elements) => {
                    return Err(TypeError::TupleIndexOutOfRange {
                        index: *index,
                        ty: Type::Tuple(elements),
                    });
                }
                other => return Err(TypeError::NotATuple(other)),
            };
            Ok(Expr::tuple_get(*index, *size, tuple).with_type(Some(element)))
        }
    }
}

/// Types several trees against one table.
pub fn type_propagate_all(exprs: &[Expr], table: &SymbolTable) -> Result<Vec<Expr>, TypeError> {
    exprs.iter().map(|expr| type_propagate(expr, table)).collect()
}

fn type_lambda(
    lambda: &Expr,
    default_param: Option<Type>,
    table: &SymbolTable,
) -> Result<Expr, TypeError> {
    let ExprKind::Lambda {
        param,
        param_ty,
        body,
    } = &lambda.kind
    else {
        return type_propagate(lambda, table);
    };
    let declared = param_ty
        .clone()
        .or(default_param)
        .ok_or_else(|| TypeError::UntypedParameter(param.clone()))?;
    let body = type_propagate(body, &table.with_variable(param.clone(), declared.clone()))?;
    let ty = Type::lam(declared, type_of(&body));
    Ok(Expr::lambda(param.clone(), param_ty.clone(), body).with_type(Some(ty)))
}

/// Type of an annotated node.
fn type_of(expr: &Expr) -> Type {
    // Only called on nodes this module has just annotated
    expr.ty.clone().unwrap_or(Type::Tuple(Vec::new()))
}
