//! Maps concrete topology values into the algebraic Val encoding.

use crate::domain::SymbolicDomain;
use crate::term::{ListVal, Val};
use thiserror::Error;
use vtlang_topology::Value;

#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    #[error("{0} values have no symbolic encoding")]
    Unsupported(&'static str),

    #[error("string {0:?} was not extracted")]
    MissingString(String),

    #[error("function '{0}' was not extracted")]
    MissingFunction(String),
}

/// Convert a concrete value. Strings and function names must already be
/// members of the domain.
pub fn convert(domain: &SymbolicDomain, value: &Value) -> Result<Val, ConvertError> {
    match value {
        Value::Int(n) => Ok(Val::Int(*n)),
        Value::Float(x) => Ok(Val::Float(*x)),
        Value::Str(s) => domain
            .string(s)
            .map(Val::Str)
            .ok_or_else(|| ConvertError::MissingString(s.clone())),
        Value::List(items) => Ok(Val::List(convert_list(domain, items)?)),
        Value::Call(call) => {
            let func = domain
                .function(&call.name)
                .ok_or_else(|| ConvertError::MissingFunction(call.name.clone()))?;
            Ok(Val::Func(func, convert_list(domain, &call.args)?))
        }
        Value::Bool(_) | Value::Null | Value::Map(_) => {
            Err(ConvertError::Unsupported(value.kind_name()))
        }
    }
}

fn convert_list(domain: &SymbolicDomain, items: &[Value]) -> Result<ListVal, ConvertError> {
    let vals = items
        .iter()
        .map(|item| convert(domain, item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ListVal::from_vals(vals))
}
