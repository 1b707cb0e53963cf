//! Concrete property values as they appear in a resolved topology.

use crate::error::TopologyError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Function names that a single-key JSON object is read as a deferred call to.
pub const INTRINSIC_FUNCTIONS: &[&str] = &[
    "get_input",
    "get_property",
    "get_attribute",
    "get_operation_output",
    "get_artifact",
    "concat",
    "join",
    "token",
];

/// A concrete topology value.
///
/// `Int`, `Float`, `Str`, `List` and `Call` are the shapes the symbolic
/// encoding understands. `Bool`, `Null` and `Map` occur in real documents and
/// are carried through so the encoder can reject them with a precise error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Deferred function call, e.g. `{ "get_input": "db_password" }`.
    Call(FunctionCall),
    Bool(bool),
    Null,
    Map(BTreeMap<String, Value>),
}

/// A deferred function call with its (possibly nested) arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Value>,
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Value>) -> Self {
        Value::Call(FunctionCall {
            name: name.into(),
            args,
        })
    }

    /// Short name of the value's shape, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Call(_) => "function call",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Map(_) => "map",
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = TopologyError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_f64() {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                } else {
                    return Err(TopologyError::IntegerOutOfRange {
                        literal: n.to_string(),
                    });
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(convert_all(items)?),
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some((name, payload)) = map.iter().next() {
                        if INTRINSIC_FUNCTIONS.contains(&name.as_str()) {
                            let args = match payload.clone() {
                                serde_json::Value::Array(items) => convert_all(items)?,
                                other => vec![Value::try_from(other)?],
                            };
                            return Ok(Value::call(name.clone(), args));
                        }
                    }
                }
                Value::Map(
                    map.into_iter()
                        .map(|(k, v)| Ok((k, Value::try_from(v)?)))
                        .collect::<Result<_, TopologyError>>()?,
                )
            }
        })
    }
}

fn convert_all(items: Vec<serde_json::Value>) -> Result<Vec<Value>, TopologyError> {
    items.into_iter().map(Value::try_from).collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Call(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}
