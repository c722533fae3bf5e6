//! Runtime values of the evaluator

use std::collections::HashMap;
use std::sync::Arc;

use super::ast::Function;
use super::parser::format_number;
use crate::preview::tree::{PropValue, VisualNode};

/// A function value with the locals visible where it was created
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub func: Arc<Function>,
    pub captured: Arc<HashMap<String, Value>>,
    /// Binding name, for diagnostics and hook slots
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
    Function(Arc<Closure>),
    /// A capability of the host scope, by dotted path (`React.useState`)
    Builtin(String),
    /// A state setter; calls are accepted and ignored by the static preview
    Setter,
    /// `new Error(message)`
    Error(String),
    /// Rendered output of a JSX expression
    Nodes(Vec<VisualNode>),
    /// Result of an expression the evaluator does not compute
    Opaque(String),
}

impl Value {
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Boolean conversion; `None` when the value was never computed
    pub fn truthiness(&self) -> Option<bool> {
        Some(match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Opaque(_) => return None,
            _ => true,
        })
    }

    /// Property lookup on objects, arrays and strings
    pub fn get(&self, key: &str) -> Value {
        match (self, key) {
            (Value::Object(entries), _) => entries
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Undefined),
            (Value::Array(items), "length") => Value::Num(items.len() as f64),
            (Value::Str(s), "length") => Value::Num(s.chars().count() as f64),
            (Value::Error(msg), "message") => Value::Str(msg.clone()),
            _ => Value::Undefined,
        }
    }

    /// String conversion as template literals and text children see it
    pub fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Num(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_display() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) | Value::Nodes(_) => "[object Object]".into(),
            Value::Function(c) => format!("function {}", c.name.as_deref().unwrap_or("")),
            Value::Builtin(path) => path.clone(),
            Value::Setter => "function".into(),
            Value::Error(msg) => {
                if msg.is_empty() {
                    "Error".into()
                } else {
                    format!("Error: {}", msg)
                }
            }
            Value::Opaque(raw) => raw.clone(),
        }
    }

    /// Convert to a host element property; `None` drops the property
    pub fn to_prop(&self) -> Option<PropValue> {
        Some(match self {
            Value::Undefined => return None,
            Value::Null => PropValue::Null,
            Value::Bool(b) => PropValue::Bool(*b),
            Value::Num(n) => PropValue::Num(*n),
            Value::Str(s) => PropValue::Str(s.clone()),
            Value::Array(items) => PropValue::List(items.iter().filter_map(Value::to_prop).collect()),
            Value::Object(entries) => PropValue::Object(
                entries
                    .iter()
                    .filter_map(|(k, v)| v.to_prop().map(|p| (k.clone(), p)))
                    .collect(),
            ),
            Value::Function(_) | Value::Builtin(_) | Value::Setter => PropValue::Function,
            Value::Error(msg) => PropValue::Str(msg.clone()),
            Value::Nodes(_) => PropValue::Expr("<element>".into()),
            Value::Opaque(raw) => PropValue::Expr(raw.clone()),
        })
    }
}
